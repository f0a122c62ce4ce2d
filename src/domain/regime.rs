//! Market regime classification and the regime-dependent risk tables.

use crate::domain::features::FeatureRow;
use std::fmt;
use std::str::FromStr;

/// Coarse market state derived from the benchmark index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    /// Strong uptrend.
    A,
    /// Mixed.
    B,
    /// Downtrend; no new entries.
    C,
}

impl Regime {
    /// Maximum fraction of equity held in open positions.
    pub fn exposure_cap(self) -> f64 {
        match self {
            Regime::A => 1.0,
            Regime::B => 0.5,
            Regime::C => 0.1,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Regime::A => "A",
            Regime::B => "B",
            Regime::C => "C",
        };
        f.write_str(label)
    }
}

/// Classifies from raw index values. Any missing average yields `C`.
pub fn classify_values(
    close: f64,
    sma10: Option<f64>,
    ema21: Option<f64>,
    sma200: Option<f64>,
) -> Regime {
    let (Some(sma10), Some(ema21), Some(sma200)) = (sma10, ema21, sma200) else {
        return Regime::C;
    };
    if close < ema21 {
        Regime::C
    } else if close > sma10 && close > ema21 && close > sma200 {
        Regime::A
    } else {
        Regime::B
    }
}

/// Classifies from the index row for the current date; no row means `C`.
pub fn classify(index_row: Option<&FeatureRow>) -> Regime {
    match index_row {
        Some(row) => classify_values(row.close, row.sma10, row.ema21, row.sma200),
        None => Regime::C,
    }
}

/// Per-regime position sizing as a fraction of available cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizingTable {
    /// 25% / 20% / 10%.
    #[default]
    Aggressive,
    /// 8% / 6% / 4%.
    Conservative,
}

impl SizingTable {
    pub fn position_size_pct(self, regime: Regime) -> f64 {
        match (self, regime) {
            (SizingTable::Aggressive, Regime::A) => 0.25,
            (SizingTable::Aggressive, Regime::B) => 0.20,
            (SizingTable::Aggressive, Regime::C) => 0.10,
            (SizingTable::Conservative, Regime::A) => 0.08,
            (SizingTable::Conservative, Regime::B) => 0.06,
            (SizingTable::Conservative, Regime::C) => 0.04,
        }
    }
}

impl FromStr for SizingTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Ok(SizingTable::Aggressive),
            "conservative" => Ok(SizingTable::Conservative),
            other => Err(format!(
                "unknown sizing table '{}', expected aggressive or conservative",
                other
            )),
        }
    }
}
