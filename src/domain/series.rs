//! Immutable per-symbol series and the unified simulation timeline.
//!
//! A [`SymbolSeries`] is built once before the simulation and never mutated.
//! Callers read it through [`SymbolSeries::at`] or [`SymbolSeries::as_of`];
//! neither exposes rows dated after the requested date.

use crate::domain::features::{compute_features, FeatureRow};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct SymbolSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
    features: Vec<FeatureRow>,
    date_index: HashMap<NaiveDate, usize>,
}

impl SymbolSeries {
    /// Computes features for `bars`, which must be sorted by date.
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        let features = compute_features(&bars);
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            symbol: symbol.into(),
            bars,
            features,
            date_index,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Row for exactly `date`, if the symbol traded that day.
    pub fn at(&self, date: NaiveDate) -> Option<&FeatureRow> {
        self.date_index.get(&date).map(|&i| &self.features[i])
    }

    /// Number of bars at or before `date`.
    pub fn history_len(&self, date: NaiveDate) -> usize {
        self.bars.partition_point(|b| b.date <= date)
    }

    /// Latest row dated at or before `date`.
    pub fn as_of(&self, date: NaiveDate) -> Option<&FeatureRow> {
        match self.history_len(date) {
            0 => None,
            n => Some(&self.features[n - 1]),
        }
    }
}

/// Sorted, deduplicated union of every series' trading dates.
pub fn build_unified_timeline(series: &[SymbolSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
