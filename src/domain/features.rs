//! Per-symbol feature rows (the indicator engine).
//!
//! [`compute_features`] is a pure function `bars -> Vec<FeatureRow>`: each row
//! depends only on bars at or before its own date, and the output is returned
//! fresh on every call.

use chrono::NaiveDate;

use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::bollinger::calculate_bollinger_width;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::extremes::{
    calculate_dist_from_high, calculate_dist_from_low, rolling_high, rolling_low,
};
use crate::domain::indicator::momentum::calculate_momentum;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::{calculate_sma, calculate_volume_sma};
use crate::domain::indicator::volatility::{calculate_realized_vol, calculate_volatility_ma};
use crate::domain::ohlcv::OhlcvBar;

pub const SMA_SHORT: usize = 10;
pub const BB_PERIOD: usize = 20;
pub const BB_STDDEV_X100: u32 = 200;
pub const SMA_MEDIUM: usize = 50;
pub const SMA_LONG: usize = 200;
pub const EMA_PERIOD: usize = 21;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const VOLUME_MA_PERIOD: usize = 20;
pub const MOM_1M: usize = 21;
pub const MOM_3M: usize = 63;
pub const MOM_6M: usize = 126;
pub const VOL_PERIOD: usize = 20;
pub const VOL_MA_PERIOD: usize = 20;
pub const EXTREME_PERIOD: usize = 252;

/// Technical state of one symbol on one date. Windowed fields are `None`
/// until their lookback is filled.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub prev_close: Option<f64>,
    pub sma10: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub ema21: Option<f64>,
    pub rsi14: Option<f64>,
    pub atr14: Option<f64>,
    pub bb_width: Option<f64>,
    pub volume_ma20: Option<f64>,
    pub mom_1m: Option<f64>,
    pub mom_3m: Option<f64>,
    pub mom_6m: Option<f64>,
    pub realized_vol: Option<f64>,
    pub volatility_ma: Option<f64>,
    pub high_252: Option<f64>,
    pub low_252: Option<f64>,
    pub dist_52w_high: Option<f64>,
    pub dist_52w_low: Option<f64>,
}

impl FeatureRow {
    /// 20-day average dollar volume: close × average volume.
    pub fn dollar_volume(&self) -> Option<f64> {
        self.volume_ma20.map(|v| self.close * v)
    }
}

pub fn compute_features(bars: &[OhlcvBar]) -> Vec<FeatureRow> {
    let sma10 = calculate_sma(bars, SMA_SHORT);
    let sma50 = calculate_sma(bars, SMA_MEDIUM);
    let sma200 = calculate_sma(bars, SMA_LONG);
    let ema21 = calculate_ema(bars, EMA_PERIOD);
    let rsi = calculate_rsi(bars, RSI_PERIOD);
    let atr = calculate_atr(bars, ATR_PERIOD);
    let bb_width = calculate_bollinger_width(bars, BB_PERIOD, BB_STDDEV_X100);
    let volume_ma = calculate_volume_sma(bars, VOLUME_MA_PERIOD);
    let mom_1m = calculate_momentum(bars, MOM_1M);
    let mom_3m = calculate_momentum(bars, MOM_3M);
    let mom_6m = calculate_momentum(bars, MOM_6M);
    let realized_vol = calculate_realized_vol(bars, VOL_PERIOD);
    let volatility_ma = calculate_volatility_ma(bars, VOL_PERIOD, VOL_MA_PERIOD);
    let high_252 = rolling_high(bars, EXTREME_PERIOD);
    let low_252 = rolling_low(bars, EXTREME_PERIOD);
    let dist_high = calculate_dist_from_high(bars, EXTREME_PERIOD);
    let dist_low = calculate_dist_from_low(bars, EXTREME_PERIOD);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| FeatureRow {
            date: bar.date,
            close: bar.close,
            high: bar.high,
            low: bar.low,
            volume: bar.volume as f64,
            prev_close: i.checked_sub(1).map(|p| bars[p].close),
            sma10: sma10.get(i),
            sma50: sma50.get(i),
            sma200: sma200.get(i),
            ema21: ema21.get(i),
            rsi14: rsi.get(i),
            atr14: atr.get(i),
            bb_width: bb_width.get(i),
            volume_ma20: volume_ma.get(i),
            mom_1m: mom_1m.get(i),
            mom_3m: mom_3m.get(i),
            mom_6m: mom_6m.get(i),
            realized_vol: realized_vol.get(i),
            volatility_ma: volatility_ma.get(i),
            high_252: high_252[i],
            low_252: low_252[i],
            dist_52w_high: dist_high.get(i),
            dist_52w_low: dist_low.get(i),
        })
        .collect()
}
