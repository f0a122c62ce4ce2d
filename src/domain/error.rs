//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for regimetrader.
#[derive(Debug, thiserror::Error)]
pub enum RegimeTraderError {
    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("malformed bar for {symbol} on {date}: {reason}")]
    MalformedBar {
        symbol: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("gate feature schema mismatch: expected [{expected}], gate declares [{actual}]")]
    GateSchema { expected: String, actual: String },

    #[error("candidate gate error: {reason}")]
    Gate { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RegimeTraderError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        RegimeTraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        RegimeTraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl RegimeTraderError {
    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            RegimeTraderError::Io(_) => 1,
            RegimeTraderError::ConfigParse { .. }
            | RegimeTraderError::ConfigMissing { .. }
            | RegimeTraderError::ConfigInvalid { .. } => 2,
            RegimeTraderError::Data { .. } | RegimeTraderError::MalformedBar { .. } => 3,
            RegimeTraderError::NoData { .. } | RegimeTraderError::InsufficientData { .. } => 5,
            RegimeTraderError::GateSchema { .. } | RegimeTraderError::Gate { .. } => 6,
        }
    }
}

impl From<&RegimeTraderError> for std::process::ExitCode {
    fn from(err: &RegimeTraderError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
