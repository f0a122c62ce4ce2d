//! Bollinger Band width.
//!
//! middle = SMA(n), upper/lower = middle ± k * STDDEV(n).
//! width = (upper - lower) / middle, 0 when middle is 0.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::stddev::calculate_stddev;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_bollinger_width(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let middle = calculate_sma(bars, period);
    let stddev = calculate_stddev(bars, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let width = match (middle.get(i), stddev.get(i)) {
                (Some(mid), Some(sd)) => {
                    let upper = mid + mult * sd;
                    let lower = mid - mult * sd;
                    Some(if mid != 0.0 { (upper - lower) / mid } else { 0.0 })
                }
                _ => None,
            };
            IndicatorPoint {
                date: bar.date,
                valid: width.is_some(),
                value: width.unwrap_or(0.0),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::BollingerWidth {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
