//! Simple moving averages of close and of volume.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    IndicatorSeries::from_options(
        IndicatorType::Sma(period),
        bars.iter().map(|b| b.date),
        &rolling_mean(&closes, period),
    )
}

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.volume as f64)).collect();
    IndicatorSeries::from_options(
        IndicatorType::VolumeSma(period),
        bars.iter().map(|b| b.date),
        &rolling_mean(&volumes, period),
    )
}
