//! Output sink for finished runs.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RegimeTraderError;
use std::path::Path;

pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), RegimeTraderError>;
}
