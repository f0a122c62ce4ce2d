//! Momentum (fractional rate of change).
//!
//! MOM(n)[i] = C[i] / C[i-n] - 1
//! If C[i-n] == 0: MOM = 0
//! Warmup: first n bars invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_momentum(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let date = bars[i].date;
        let valid = period > 0 && i >= period;

        let value = if valid {
            let prev_close = bars[i - period].close;
            if prev_close == 0.0 {
                0.0
            } else {
                bars[i].close / prev_close - 1.0
            }
        } else {
            0.0
        };

        values.push(IndicatorPoint { date, valid, value });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Momentum(period),
        values,
    }
}
