//! RSI (Relative Strength Index) over a trailing simple mean.
//!
//! Day-over-day close deltas are split into gains and losses (each floored at
//! zero). avg_gain / avg_loss are the plain means of the last n of each.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, or 50 when avg_gain is also 0.
//!
//! Warmup: first n bars are invalid (need n price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if period == 0 || i < period {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: 0.0,
            });
            continue;
        }

        let mut gain_sum = 0.0;
        let mut loss_sum = 0.0;
        for j in (i + 1 - period)..=i {
            let change = bars[j].close - bars[j - 1].close;
            if change > 0.0 {
                gain_sum += change;
            } else {
                loss_sum -= change;
            }
        }
        let avg_gain = gain_sum / period as f64;
        let avg_loss = loss_sum / period as f64;

        values.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: rsi_from_averages(avg_gain, avg_loss),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
