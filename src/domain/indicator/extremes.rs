//! Distance from the trailing high/low (52-week extremes at n = 252).
//!
//! DISTHIGH(n)[i] = (C[i] - max(H[i-n+1..=i])) / max(...)
//! DISTLOW(n)[i]  = (C[i] - min(L[i-n+1..=i])) / min(...)
//! A zero extreme yields 0. Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

/// Trailing max of high over `period` bars, `None` during warmup.
pub fn rolling_high(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    rolling_extreme(bars, period, |b| b.high, f64::max)
}

/// Trailing min of low over `period` bars, `None` during warmup.
pub fn rolling_low(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    rolling_extreme(bars, period, |b| b.low, f64::min)
}

fn rolling_extreme(
    bars: &[OhlcvBar],
    period: usize,
    field: fn(&OhlcvBar) -> f64,
    pick: fn(f64, f64) -> f64,
) -> Vec<Option<f64>> {
    (0..bars.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            bars[i + 1 - period..=i].iter().map(field).reduce(pick)
        })
        .collect()
}

pub fn calculate_dist_from_high(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    distance_series(bars, IndicatorType::DistFromHigh(period), rolling_high(bars, period))
}

pub fn calculate_dist_from_low(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    distance_series(bars, IndicatorType::DistFromLow(period), rolling_low(bars, period))
}

fn distance_series(
    bars: &[OhlcvBar],
    indicator_type: IndicatorType,
    extremes: Vec<Option<f64>>,
) -> IndicatorSeries {
    let values = bars
        .iter()
        .zip(extremes)
        .map(|(bar, extreme)| match extreme {
            Some(x) => IndicatorPoint {
                date: bar.date,
                valid: true,
                value: if x != 0.0 { (bar.close - x) / x } else { 0.0 },
            },
            None => IndicatorPoint {
                date: bar.date,
                valid: false,
                value: 0.0,
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
