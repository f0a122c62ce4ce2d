//! Cross-sectional market breadth for one date.

use crate::domain::series::SymbolSeries;
use chrono::NaiveDate;

/// Below this many eligible symbols the neutral snapshot is returned.
pub const MIN_BREADTH_SYMBOLS: usize = 50;

const NEAR_HIGH: f64 = 0.98;
const NEAR_LOW: f64 = 1.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breadth {
    /// Percent of symbols closing above their SMA200.
    pub pct_above_200sma: f64,
    /// Percent of symbols within 2% of their 252-day high.
    pub pct_at_52w_high: f64,
    pub adv_dec_ratio: f64,
    /// (near-high count - near-low count) / total, in percent.
    pub new_highs_lows: f64,
}

impl Default for Breadth {
    fn default() -> Self {
        Self {
            pct_above_200sma: 50.0,
            pct_at_52w_high: 5.0,
            adv_dec_ratio: 1.0,
            new_highs_lows: 0.0,
        }
    }
}

pub fn compute_breadth(universe: &[SymbolSeries], date: NaiveDate) -> Breadth {
    let rows: Vec<_> = universe
        .iter()
        .filter_map(|s| s.at(date))
        .filter(|r| r.sma200.is_some())
        .collect();

    if rows.len() < MIN_BREADTH_SYMBOLS {
        return Breadth::default();
    }
    let total = rows.len() as f64;

    let mut above = 0usize;
    let mut near_high = 0usize;
    let mut near_low = 0usize;
    let mut advancers = 0usize;
    let mut decliners = 0usize;

    for row in &rows {
        if row.sma200.is_some_and(|s| row.close > s) {
            above += 1;
        }
        if row.high_252.is_some_and(|h| row.close >= h * NEAR_HIGH) {
            near_high += 1;
        }
        if row.low_252.is_some_and(|l| row.close <= l * NEAR_LOW) {
            near_low += 1;
        }
        match row.prev_close {
            Some(prev) if row.close > prev => advancers += 1,
            Some(prev) if row.close < prev => decliners += 1,
            _ => {}
        }
    }

    Breadth {
        pct_above_200sma: above as f64 / total * 100.0,
        pct_at_52w_high: near_high as f64 / total * 100.0,
        adv_dec_ratio: advancers as f64 / decliners.max(1) as f64,
        new_highs_lows: (near_high as f64 - near_low as f64) / total * 100.0,
    }
}
