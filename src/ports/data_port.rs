//! Historical bar source port.

use crate::domain::error::RegimeTraderError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Chronological daily bars for `symbol`. `lookback_days == 0` means the
    /// full available history; otherwise only the most recent
    /// `lookback_days` calendar days before the latest bar are returned.
    fn get_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<OhlcvBar>, RegimeTraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, RegimeTraderError>;
}
