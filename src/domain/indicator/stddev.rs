//! Standard Deviation of close.
//!
//! Sample standard deviation over n closing prices.
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{rolling_sample_stddev, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stddev(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    IndicatorSeries::from_options(
        IndicatorType::Stddev(period),
        bars.iter().map(|b| b.date),
        &rolling_sample_stddev(&closes, period),
    )
}
