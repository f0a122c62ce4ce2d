//! Candidate ranking and the rotation schedule.
//!
//! At each rotation boundary the universe is filtered by liquidity and trend,
//! scored by 3-month relative strength against the index, and the strongest
//! names become the [`FocusList`] for the next window.

use crate::domain::features::FeatureRow;
use crate::domain::regime::Regime;
use crate::domain::series::SymbolSeries;
use crate::domain::universe::MIN_BARS;
use chrono::{Datelike, NaiveDate, Weekday};
use std::cmp::Ordering;
use tracing::debug;

pub const DEFAULT_MIN_DOLLAR_VOLUME: f64 = 5_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FocusEntry {
    pub symbol: String,
    pub relative_strength: f64,
}

/// Symbols eligible for entry during one rotation window, strongest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusList {
    entries: Vec<FocusEntry>,
}

impl FocusList {
    pub fn new(entries: Vec<FocusEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FocusEntry] {
        &self.entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerConfig {
    pub min_dollar_volume: f64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            min_dollar_volume: DEFAULT_MIN_DOLLAR_VOLUME,
        }
    }
}

/// Focus list size for a regime.
pub fn target_size(regime: Regime) -> usize {
    match regime {
        Regime::A => 25,
        Regime::B | Regime::C => 10,
    }
}

/// Relative strength a candidate must strictly exceed.
pub fn min_relative_strength(regime: Regime) -> f64 {
    match regime {
        Regime::A => 0.0,
        Regime::B | Regime::C => 0.05,
    }
}

fn passes_trend(row: &FeatureRow, regime: Regime) -> bool {
    match (regime, row.ema21, row.sma50, row.sma200) {
        (Regime::A, _, Some(sma50), Some(sma200)) => row.close > sma50 && sma50 > sma200,
        (_, Some(ema21), Some(sma50), Some(sma200)) => {
            row.close > ema21 && ema21 > sma50 && sma50 > sma200
        }
        _ => false,
    }
}

fn passes_liquidity(row: &FeatureRow, config: &RankerConfig) -> bool {
    row.dollar_volume()
        .is_some_and(|dv| dv >= config.min_dollar_volume)
}

/// Stock 3-month return minus index 3-month return. A missing index term
/// counts as 0.
pub fn relative_strength(row: &FeatureRow, index_row: Option<&FeatureRow>) -> Option<f64> {
    let index_mom = index_row.and_then(|r| r.mom_3m).unwrap_or(0.0);
    row.mom_3m.map(|m| m - index_mom)
}

pub fn rank_candidates(
    universe: &[SymbolSeries],
    index_row: Option<&FeatureRow>,
    regime: Regime,
    date: NaiveDate,
    config: &RankerConfig,
) -> FocusList {
    if regime == Regime::C {
        return FocusList::default();
    }
    let threshold = min_relative_strength(regime);

    let mut scored: Vec<FocusEntry> = universe
        .iter()
        .filter(|s| s.history_len(date) >= MIN_BARS)
        .filter_map(|s| {
            let row = s.at(date)?;
            if !passes_liquidity(row, config) || !passes_trend(row, regime) {
                return None;
            }
            let rs = relative_strength(row, index_row)?;
            (rs > threshold).then(|| FocusEntry {
                symbol: s.symbol().to_string(),
                relative_strength: rs,
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.relative_strength
            .partial_cmp(&a.relative_strength)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    scored.truncate(target_size(regime));

    debug!(
        %date,
        %regime,
        count = scored.len(),
        top = ?scored.iter().take(5).map(|e| e.symbol.as_str()).collect::<Vec<_>>(),
        "ranked candidates"
    );

    FocusList::new(scored)
}

/// Decides when the focus list is recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationSchedule {
    pub period_days: u32,
    pub weekday: Option<Weekday>,
    last_rotation: Option<NaiveDate>,
}

impl RotationSchedule {
    pub fn new(period_days: u32, weekday: Option<Weekday>) -> Self {
        Self {
            period_days,
            weekday,
            last_rotation: None,
        }
    }

    pub fn is_boundary(&self, date: NaiveDate, focus_is_empty: bool) -> bool {
        let Some(last) = self.last_rotation else {
            return true;
        };
        focus_is_empty
            || self.weekday.is_some_and(|w| date.weekday() == w && date != last)
            || (date - last).num_days() >= i64::from(self.period_days)
    }

    pub fn mark(&mut self, date: NaiveDate) {
        self.last_rotation = Some(date);
    }
}

impl Default for RotationSchedule {
    fn default() -> Self {
        Self::new(7, Some(Weekday::Mon))
    }
}
