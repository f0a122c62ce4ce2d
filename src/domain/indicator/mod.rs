//! Trailing technical indicators.
//!
//! Every indicator is a pure function of a chronological bar slice and returns a
//! fresh [`IndicatorSeries`] aligned one-to-one with the input. A point at index
//! `i` depends only on bars `0..=i`; warm-up points are marked invalid.
//!
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod extremes;
pub mod momentum;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod volatility;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Stddev(usize),
    BollingerWidth { period: usize, stddev_mult_x100: u32 },
    VolumeSma(usize),
    Momentum(usize),
    RealizedVol(usize),
    VolatilityMa(usize),
    DistFromHigh(usize),
    DistFromLow(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at `index`, or `None` when out of range or still warming up.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(IndicatorPoint::get)
    }

    pub(crate) fn from_options(
        indicator_type: IndicatorType,
        dates: impl Iterator<Item = NaiveDate>,
        values: &[Option<f64>],
    ) -> Self {
        let values = dates
            .zip(values)
            .map(|(date, v)| IndicatorPoint {
                date,
                valid: v.is_some(),
                value: v.unwrap_or(0.0),
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::BollingerWidth {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BBWIDTH({},{})", period, mult)
            }
            IndicatorType::VolumeSma(period) => write!(f, "VOLSMA({})", period),
            IndicatorType::Momentum(period) => write!(f, "MOM({})", period),
            IndicatorType::RealizedVol(period) => write!(f, "RVOL({})", period),
            IndicatorType::VolatilityMa(period) => write!(f, "RVOLMA({})", period),
            IndicatorType::DistFromHigh(period) => write!(f, "DISTHIGH({})", period),
            IndicatorType::DistFromLow(period) => write!(f, "DISTLOW({})", period),
        }
    }
}

/// Trailing mean over `period` values. A window containing a missing value is missing.
pub(crate) fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling_apply(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing sample standard deviation (n - 1 denominator).
pub(crate) fn rolling_sample_stddev(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; values.len()];
    }
    rolling_apply(values, period, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let ss: f64 = w.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    })
}

fn rolling_apply<F>(values: &[Option<f64>], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = Vec::with_capacity(values.len());
    let mut window: Vec<f64> = Vec::with_capacity(period);
    for i in 0..values.len() {
        if period == 0 || i + 1 < period {
            out.push(None);
            continue;
        }
        window.clear();
        let complete = values[i + 1 - period..=i].iter().all(|v| match v {
            Some(x) => {
                window.push(*x);
                true
            }
            None => false,
        });
        out.push(complete.then(|| f(&window)));
    }
    out
}
