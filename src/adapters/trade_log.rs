//! CSV trade log.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RegimeTraderError;
use crate::domain::position::Trade;
use crate::ports::report_port::ReportPort;
use std::fs::File;
use std::io;
use std::path::Path;

const HEADER: [&str; 11] = [
    "symbol",
    "entry_date",
    "entry_price",
    "exit_date",
    "exit_price",
    "allocated_capital",
    "highest_price",
    "pnl",
    "return_pct",
    "days_held",
    "exit_reason",
];

/// Writes closed trades, one row each, in the order they were closed.
pub struct CsvTradeLog;

/// Serialises `trades` to any writer.
pub fn write_trades<W: io::Write>(writer: W, trades: &[Trade]) -> Result<(), RegimeTraderError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).map_err(io::Error::from)?;
    for t in trades {
        wtr.write_record([
            t.symbol.clone(),
            t.entry_date.to_string(),
            format!("{:.4}", t.entry_price),
            t.exit_date.to_string(),
            format!("{:.4}", t.exit_price),
            format!("{:.2}", t.allocated_capital),
            format!("{:.4}", t.highest_price),
            format!("{:.2}", t.pnl),
            format!("{:.6}", t.return_pct),
            t.days_held().to_string(),
            t.exit_reason.to_string(),
        ])
        .map_err(io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvTradeLog {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), RegimeTraderError> {
        let file = File::create(output_path)?;
        write_trades(file, &result.portfolio.trades)?;
        tracing::info!(
            path = %output_path.display(),
            trades = result.portfolio.trades.len(),
            "trade log written"
        );
        Ok(())
    }
}
