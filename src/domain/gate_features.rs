//! Fixed-schema feature record handed to a [`CandidateGate`].
//!
//! Percent-like values are scaled by 100. Inputs still in warm-up fall back
//! to neutral values so every record is fully populated.

use crate::domain::breadth::Breadth;
use crate::domain::error::RegimeTraderError;
use crate::domain::features::FeatureRow;
use crate::ports::candidate_gate::CandidateGate;

pub const FEATURE_COUNT: usize = 22;

pub const FIELD_NAMES: [&str; FEATURE_COUNT] = [
    "rsi",
    "vol_ratio",
    "atr_pct",
    "sma50_dist",
    "sma200_dist",
    "ema21_dist",
    "bb_width",
    "index_trend",
    "rs_rel",
    "mom_1m",
    "mom_3m",
    "mom_6m",
    "realized_vol",
    "vol_spike",
    "dist_52w_high",
    "dist_52w_low",
    "pct_above_200sma",
    "pct_at_52w_high",
    "adv_dec_ratio",
    "new_highs_lows",
    "index_rsi",
    "index_realized_vol",
];

const VOL_RATIO_CAP: f64 = 5.0;
const VOL_SPIKE_CAP: f64 = 3.0;
const ADV_DEC_CAP: f64 = 5.0;
const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateFeatures {
    pub rsi: f64,
    pub vol_ratio: f64,
    pub atr_pct: f64,
    pub sma50_dist: f64,
    pub sma200_dist: f64,
    pub ema21_dist: f64,
    pub bb_width: f64,
    pub index_trend: f64,
    pub rs_rel: f64,
    pub mom_1m: f64,
    pub mom_3m: f64,
    pub mom_6m: f64,
    pub realized_vol: f64,
    pub vol_spike: f64,
    pub dist_52w_high: f64,
    pub dist_52w_low: f64,
    pub pct_above_200sma: f64,
    pub pct_at_52w_high: f64,
    pub adv_dec_ratio: f64,
    pub new_highs_lows: f64,
    pub index_rsi: f64,
    pub index_realized_vol: f64,
}

fn pct(v: Option<f64>) -> f64 {
    v.map_or(0.0, |x| x * 100.0)
}

fn pct_from(close: f64, reference: Option<f64>) -> f64 {
    match reference {
        Some(r) if r != 0.0 => (close / r - 1.0) * 100.0,
        _ => 0.0,
    }
}

fn capped_ratio(num: f64, den: Option<f64>, cap: f64) -> f64 {
    match den {
        Some(d) if d > 0.0 => (num / d).min(cap),
        _ => 1.0,
    }
}

impl GateFeatures {
    pub fn build(row: &FeatureRow, index_row: Option<&FeatureRow>, breadth: &Breadth) -> Self {
        let index_mom = index_row.and_then(|r| r.mom_3m).unwrap_or(0.0);
        let index_trend = index_row
            .and_then(|r| r.sma200.map(|s| r.close > s))
            .map_or(0.0, |above| if above { 1.0 } else { 0.0 });

        Self {
            rsi: row.rsi14.unwrap_or(NEUTRAL_RSI),
            vol_ratio: capped_ratio(row.volume, row.volume_ma20, VOL_RATIO_CAP),
            atr_pct: match row.atr14 {
                Some(atr) if row.close != 0.0 => atr / row.close * 100.0,
                _ => 0.0,
            },
            sma50_dist: pct_from(row.close, row.sma50),
            sma200_dist: pct_from(row.close, row.sma200),
            ema21_dist: pct_from(row.close, row.ema21),
            bb_width: pct(row.bb_width),
            index_trend,
            rs_rel: row.mom_3m.map_or(0.0, |m| (m - index_mom) * 100.0),
            mom_1m: pct(row.mom_1m),
            mom_3m: pct(row.mom_3m),
            mom_6m: pct(row.mom_6m),
            realized_vol: pct(row.realized_vol),
            vol_spike: match row.realized_vol {
                Some(rv) => capped_ratio(rv, row.volatility_ma, VOL_SPIKE_CAP),
                None => 1.0,
            },
            dist_52w_high: pct(row.dist_52w_high),
            dist_52w_low: pct(row.dist_52w_low),
            pct_above_200sma: breadth.pct_above_200sma,
            pct_at_52w_high: breadth.pct_at_52w_high,
            adv_dec_ratio: breadth.adv_dec_ratio.min(ADV_DEC_CAP),
            new_highs_lows: breadth.new_highs_lows,
            index_rsi: index_row.and_then(|r| r.rsi14).unwrap_or(NEUTRAL_RSI),
            index_realized_vol: pct(index_row.and_then(|r| r.realized_vol)),
        }
    }

    /// Values in [`FIELD_NAMES`] order.
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.rsi,
            self.vol_ratio,
            self.atr_pct,
            self.sma50_dist,
            self.sma200_dist,
            self.ema21_dist,
            self.bb_width,
            self.index_trend,
            self.rs_rel,
            self.mom_1m,
            self.mom_3m,
            self.mom_6m,
            self.realized_vol,
            self.vol_spike,
            self.dist_52w_high,
            self.dist_52w_low,
            self.pct_above_200sma,
            self.pct_at_52w_high,
            self.adv_dec_ratio,
            self.new_highs_lows,
            self.index_rsi,
            self.index_realized_vol,
        ]
    }
}

/// Fails unless the gate declares exactly [`FIELD_NAMES`], in order.
pub fn validate_gate_schema(gate: &dyn CandidateGate) -> Result<(), RegimeTraderError> {
    let declared = gate.feature_names();
    if declared.iter().map(String::as_str).eq(FIELD_NAMES) {
        return Ok(());
    }
    Err(RegimeTraderError::GateSchema {
        expected: FIELD_NAMES.join(","),
        actual: declared.join(","),
    })
}
