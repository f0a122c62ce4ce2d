//! Tradeable universe loading.
//!
//! Parses symbol lists, fetches every symbol's history through a
//! [`DataPort`], drops symbols whose data is unusable and precomputes
//! feature rows for the survivors in parallel.

use crate::domain::error::RegimeTraderError;
use crate::domain::ohlcv::{find_malformed, OhlcvBar};
use crate::domain::series::SymbolSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Minimum history a symbol needs before it is simulated.
pub const MIN_BARS: usize = 200;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
    MalformedBar { date: NaiveDate, reason: String },
    FetchFailed(String),
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct Universe {
    /// Tradeable symbols in input order.
    pub series: Vec<SymbolSeries>,
    /// Benchmark series; `None` runs the simulation in degraded mode.
    pub index: Option<SymbolSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.series.len()
    }
}

/// Checks a fetched history and returns it unchanged when usable.
pub fn validate_bars(
    symbol: &str,
    bars: Vec<OhlcvBar>,
    minimum: usize,
) -> Result<Vec<OhlcvBar>, RegimeTraderError> {
    if bars.is_empty() {
        return Err(RegimeTraderError::NoData {
            symbol: symbol.to_string(),
        });
    }
    if let Some((date, reason)) = find_malformed(&bars) {
        return Err(RegimeTraderError::MalformedBar {
            symbol: symbol.to_string(),
            date,
            reason: reason.to_string(),
        });
    }
    if bars.len() < minimum {
        return Err(RegimeTraderError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum,
        });
    }
    Ok(bars)
}

fn skip_reason(err: RegimeTraderError) -> SkipReason {
    match err {
        RegimeTraderError::NoData { .. } => SkipReason::NoData,
        RegimeTraderError::InsufficientData { bars, .. } => SkipReason::InsufficientBars { bars },
        RegimeTraderError::MalformedBar { date, reason, .. } => {
            SkipReason::MalformedBar { date, reason }
        }
        other => SkipReason::FetchFailed(other.to_string()),
    }
}

fn fetch_index(
    data_port: &dyn DataPort,
    index_symbol: &str,
    lookback_days: u32,
) -> Option<Vec<OhlcvBar>> {
    let fetched = data_port
        .get_history(index_symbol, lookback_days)
        .and_then(|bars| validate_bars(index_symbol, bars, 1));
    match fetched {
        Ok(bars) => {
            info!(symbol = index_symbol, bars = bars.len(), "index loaded");
            Some(bars)
        }
        Err(e) => {
            warn!(symbol = index_symbol, error = %e, "index unavailable, regime forced defensive");
            None
        }
    }
}

/// Loads `symbols` plus the benchmark. Fetching is sequential; feature
/// computation runs in parallel and preserves input order.
pub fn load_universe(
    data_port: &dyn DataPort,
    symbols: Vec<String>,
    index_symbol: &str,
    lookback_days: u32,
) -> Result<Universe, RegimeTraderError> {
    let mut fetched = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        if symbol == index_symbol {
            debug!(symbol = %symbol, "benchmark removed from tradeable list");
            continue;
        }
        let result = data_port
            .get_history(&symbol, lookback_days)
            .and_then(|bars| validate_bars(&symbol, bars, MIN_BARS));
        match result {
            Ok(bars) => {
                debug!(symbol = %symbol, bars = bars.len(), "symbol ok");
                fetched.push((symbol, bars));
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: skip_reason(e),
                });
            }
        }
    }

    if fetched.is_empty() {
        return Err(RegimeTraderError::InsufficientData {
            symbol: "all".to_string(),
            bars: 0,
            minimum: MIN_BARS,
        });
    }

    let index_bars = fetch_index(data_port, index_symbol, lookback_days);

    let series: Vec<SymbolSeries> = fetched
        .into_par_iter()
        .map(|(symbol, bars)| SymbolSeries::new(symbol, bars))
        .collect();
    let index = index_bars.map(|bars| SymbolSeries::new(index_symbol, bars));

    info!(
        loaded = series.len(),
        skipped = skipped.len(),
        "universe ready"
    );

    Ok(Universe {
        series,
        index,
        skipped,
    })
}
