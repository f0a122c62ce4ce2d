//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Returns a description of the first structural problem with this bar, if any.
    pub fn defect(&self) -> Option<&'static str> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Some("non-finite price");
        }
        if self.close <= 0.0 {
            return Some("non-positive close");
        }
        if self.high < self.low {
            return Some("high below low");
        }
        if self.volume < 0 {
            return Some("negative volume");
        }
        None
    }
}

/// Checks a chronological bar sequence, returning the date and reason of the
/// first malformed bar. Dates must be strictly increasing.
pub fn find_malformed(bars: &[OhlcvBar]) -> Option<(NaiveDate, &'static str)> {
    for (i, bar) in bars.iter().enumerate() {
        if let Some(reason) = bar.defect() {
            return Some((bar.date, reason));
        }
        if i > 0 && bars[i - 1].date >= bar.date {
            return Some((bar.date, "dates not strictly increasing"));
        }
    }
    None
}
