//! Average True Range as a trailing simple mean of true range.
//!
//! TR[0] = H[0] - L[0]; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR(n)[i] = mean(TR[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let true_ranges: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let tr = if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            };
            Some(tr)
        })
        .collect();

    IndicatorSeries::from_options(
        IndicatorType::Atr(period),
        bars.iter().map(|b| b.date),
        &rolling_mean(&true_ranges, period),
    )
}
