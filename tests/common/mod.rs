#![allow(dead_code)]

use chrono::NaiveDate;
use regimetrader::domain::error::RegimeTraderError;
use regimetrader::domain::gate_features::{GateFeatures, FIELD_NAMES};
pub use regimetrader::domain::ohlcv::OhlcvBar;
use regimetrader::ports::candidate_gate::CandidateGate;
use regimetrader::ports::data_port::DataPort;
use std::collections::HashMap;

/// Bar index at which scenario positions are entered; leaves enough history
/// for every indicator to be warm.
pub const ENTRY_INDEX: usize = 260;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn get_history(
        &self,
        symbol: &str,
        _lookback_days: u32,
    ) -> Result<Vec<OhlcvBar>, RegimeTraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RegimeTraderError::Data {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| RegimeTraderError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, RegimeTraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Gate that returns the same probability for every candidate.
pub struct FixedGate {
    pub probability: f64,
    pub names: Vec<String>,
}

impl FixedGate {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            names: FIELD_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CandidateGate for FixedGate {
    fn feature_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn predict(&self, _features: &GateFeatures) -> Result<f64, RegimeTraderError> {
        Ok(self.probability)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Calendar date of bar `i` in every generated series.
pub fn day(i: usize) -> NaiveDate {
    date(2020, 1, 1) + chrono::Duration::days(i as i64)
}

pub fn bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: day(i),
        open,
        high,
        low,
        close,
        volume: 1_000_000,
    }
}

/// Compounding series with `close == anchor_price` at bar `anchor`, a
/// half-percent range either side of the close.
pub fn geometric_bars(count: usize, anchor: usize, anchor_price: f64, growth: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let close = anchor_price * (1.0 + growth).powi(i as i32 - anchor as i32);
            bar(i, close, close * 1.005, close * 0.995, close)
        })
        .collect()
}

/// Slow linear uptrend; classifies as regime A once warm.
pub fn index_bars(count: usize) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let close = 100.0 + 0.05 * i as f64;
            bar(i, close, close + 0.5, close - 0.5, close)
        })
        .collect()
}

/// Uptrend with a sine wobble, producing pullbacks that can trip stops.
pub fn wavy_bars(count: usize, base: f64, growth: f64, amplitude: f64, period: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = base * (1.0 + growth).powf(t) * (1.0 + amplitude * (t / period).sin());
            bar(i, close, close * 1.01, close * 0.99, close)
        })
        .collect()
}
