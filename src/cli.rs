//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::logistic_gate::LogisticGate;
use crate::adapters::trade_log::CsvTradeLog;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    gate_model_path, load_backtest_config, load_data_settings, validate_config, DataSettings,
};
use crate::domain::error::RegimeTraderError;
use crate::domain::metrics::{exit_reason_counts, Metrics, SymbolResult};
use crate::domain::regime::Regime;
use crate::domain::universe::load_universe;
use crate::ports::candidate_gate::CandidateGate;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "regimetrader", about = "Regime-aware momentum backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and print the performance report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of <SYMBOL>.csv bar files; overrides [backtest] data_dir
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Write closed trades to this CSV file
        #[arg(short, long)]
        trades: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a backtest run needs, resolved from config and flags.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub backtest: BacktestConfig,
    pub data: DataSettings,
    pub data_dir: PathBuf,
    pub model_path: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data_dir,
            trades,
            dry_run,
        } => run_backtest(&config, data_dir, trades.as_deref(), dry_run),
        Command::Validate { config } => run_validate(&config),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn plan_run(
    config: &dyn ConfigPort,
    data_dir_override: Option<PathBuf>,
) -> Result<RunPlan, RegimeTraderError> {
    let backtest = load_backtest_config(config)?;
    let data = load_data_settings(config)?;
    let model_path = gate_model_path(config)?;
    let data_dir = data_dir_override
        .or_else(|| data.data_dir.clone())
        .ok_or_else(|| RegimeTraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "data_dir".to_string(),
        })?;
    Ok(RunPlan {
        backtest,
        data,
        data_dir,
        model_path,
    })
}

/// Loads the universe and gate for `plan`, then runs the simulation.
pub fn execute(plan: &RunPlan) -> Result<BacktestResult, RegimeTraderError> {
    let data_port = CsvAdapter::new(plan.data_dir.clone());
    let symbols = match &plan.data.symbols {
        Some(list) => list.clone(),
        None => data_port.list_symbols()?,
    };
    info!(
        symbols = symbols.len(),
        index = %plan.data.index_symbol,
        data_dir = %plan.data_dir.display(),
        "loading universe"
    );
    let universe = load_universe(
        &data_port,
        symbols,
        &plan.data.index_symbol,
        plan.data.lookback_days,
    )?;

    let gate = match (&plan.model_path, plan.backtest.ml_enabled) {
        (Some(path), true) => {
            info!(path = %path.display(), "loading candidate gate");
            Some(LogisticGate::from_file(path)?)
        }
        _ => None,
    };

    backtest_engine::run_backtest(
        &universe,
        &plan.backtest,
        gate.as_ref().map(|g| g as &dyn CandidateGate),
    )
}

fn fmt_metric(name: &str, value: f64) -> String {
    match name {
        "total_trades" | "max_consecutive_wins" | "max_consecutive_losses" | "open_positions" => {
            format!("{:.0}", value)
        }
        _ => format!("{:.4}", value),
    }
}

/// Flat text report: one `name: value` line per metric, then per-symbol and
/// exit-reason summaries.
pub fn format_report(result: &BacktestResult, metrics: &Metrics) -> String {
    let mut out = String::new();
    for (name, value) in metrics.entries() {
        let _ = writeln!(out, "{:<24}{}", format!("{}:", name), fmt_metric(name, value));
    }

    let _ = writeln!(out, "\n[regimes]");
    for regime in [Regime::A, Regime::B, Regime::C] {
        let days = result.regime_days.get(&regime).copied().unwrap_or(0);
        let _ = writeln!(out, "{:<24}{}", format!("{}:", regime), days);
    }

    let reasons = exit_reason_counts(&result.portfolio.trades);
    if !reasons.is_empty() {
        let _ = writeln!(out, "\n[exits]");
        for (reason, count) in &reasons {
            let _ = writeln!(out, "{:<28}{}", format!("{}:", reason), count);
        }
    }

    let per_symbol = SymbolResult::compute_per_symbol(&result.portfolio.trades);
    if !per_symbol.is_empty() {
        let _ = writeln!(out, "\n[symbols]");
        for s in &per_symbol {
            let _ = writeln!(
                out,
                "{:<8}{} trades, {:.1}% win rate, {:.2} pnl",
                s.symbol,
                s.total_trades,
                s.win_rate * 100.0,
                s.total_pnl
            );
        }
    }
    out
}

fn run_backtest(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    trades_path: Option<&Path>,
    dry_run: bool,
) -> Result<(), RegimeTraderError> {
    info!(path = %config_path.display(), "loading config");
    let config = FileConfigAdapter::from_file(config_path)?;
    let plan = plan_run(&config, data_dir)?;

    if dry_run {
        let symbols = plan
            .data
            .symbols
            .as_ref()
            .map_or_else(|| "<all in data dir>".to_string(), |s| s.join(", "));
        eprintln!("Config validated successfully");
        eprintln!("  range:   {} to {}", plan.backtest.start_date, plan.backtest.end_date);
        eprintln!("  index:   {}", plan.data.index_symbol);
        eprintln!("  symbols: {}", symbols);
        eprintln!("  data:    {}", plan.data_dir.display());
        eprintln!("  sizing:  {:?}", plan.backtest.sizing);
        eprintln!("  gate:    {}", if plan.backtest.ml_enabled { "enabled" } else { "disabled" });
        return Ok(());
    }

    let result = execute(&plan)?;
    let metrics = Metrics::compute(&result.portfolio, plan.backtest.risk_free_rate);
    print!("{}", format_report(&result, &metrics));

    if let Some(path) = trades_path {
        CsvTradeLog.write(&result, path)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RegimeTraderError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    validate_config(&config)?;
    eprintln!("Configuration is valid.");
    Ok(())
}
