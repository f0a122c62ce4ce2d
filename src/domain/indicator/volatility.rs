//! Annualized realized volatility and its moving average.
//!
//! r[i] = C[i] / C[i-1] - 1 (undefined at i = 0).
//! RVOL(n)[i] = sample_stddev(r[i-n+1..=i]) * sqrt(252). Warmup: first n bars.
//! RVOLMA(m) is the trailing mean of RVOL(n) over m points.

use crate::domain::indicator::{
    rolling_mean, rolling_sample_stddev, IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::OhlcvBar;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

fn daily_returns(bars: &[OhlcvBar]) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                return None;
            }
            let prev = bars[i - 1].close;
            Some(if prev != 0.0 { bar.close / prev - 1.0 } else { 0.0 })
        })
        .collect()
}

fn realized(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    rolling_sample_stddev(&daily_returns(bars), period)
        .into_iter()
        .map(|sd| sd.map(|v| v * TRADING_DAYS_PER_YEAR.sqrt()))
        .collect()
}

pub fn calculate_realized_vol(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries::from_options(
        IndicatorType::RealizedVol(period),
        bars.iter().map(|b| b.date),
        &realized(bars, period),
    )
}

pub fn calculate_volatility_ma(
    bars: &[OhlcvBar],
    vol_period: usize,
    ma_period: usize,
) -> IndicatorSeries {
    IndicatorSeries::from_options(
        IndicatorType::VolatilityMa(ma_period),
        bars.iter().map(|b| b.date),
        &rolling_mean(&realized(bars, vol_period), ma_period),
    )
}
