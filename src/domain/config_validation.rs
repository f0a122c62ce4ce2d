//! Configuration loading and validation.
//!
//! Every key is checked before any data is loaded. Absent keys take their
//! defaults; present but unparseable or out-of-range values are errors.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::RegimeTraderError;
use crate::domain::position::ExitRules;
use crate::domain::ranker::{RankerConfig, DEFAULT_MIN_DOLLAR_VOLUME};
use crate::domain::regime::SizingTable;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::{NaiveDate, Weekday};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

const BACKTEST: &str = "backtest";
const RISK: &str = "risk";
const ROTATION: &str = "rotation";
const GATE: &str = "gate";

/// Where bars come from and which symbols to trade.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub index_symbol: String,
    /// `None` means every symbol the data source lists.
    pub symbols: Option<Vec<String>>,
    pub data_dir: Option<PathBuf>,
    pub lookback_days: u32,
}

fn parse_or<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, RegimeTraderError>
where
    T: FromStr,
    T::Err: Display,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| RegimeTraderError::invalid(section, key, format!("'{}': {}", raw, e))),
    }
}

fn check(ok: bool, section: &str, key: &str, reason: &str) -> Result<(), RegimeTraderError> {
    if ok {
        Ok(())
    } else {
        Err(RegimeTraderError::invalid(section, key, reason))
    }
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, RegimeTraderError> {
    let raw = config
        .get_string(BACKTEST, key)
        .ok_or_else(|| RegimeTraderError::missing(BACKTEST, key))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        RegimeTraderError::invalid(BACKTEST, key, format!("invalid {} format, expected YYYY-MM-DD", key))
    })
}

fn parse_weekday(config: &dyn ConfigPort) -> Result<Option<Weekday>, RegimeTraderError> {
    let Some(raw) = config.get_string(ROTATION, "rotation_weekday") else {
        return Ok(Some(Weekday::Mon));
    };
    let value = raw.trim().to_ascii_lowercase();
    if value == "none" {
        return Ok(None);
    }
    match value.parse::<Weekday>() {
        Ok(Weekday::Sat) | Ok(Weekday::Sun) | Err(_) => Err(RegimeTraderError::invalid(
            ROTATION,
            "rotation_weekday",
            "expected mon, tue, wed, thu, fri or none",
        )),
        Ok(day) => Ok(Some(day)),
    }
}

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, RegimeTraderError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;
    check(
        start_date < end_date,
        BACKTEST,
        "start_date",
        "start_date must be before end_date",
    )?;

    let initial_capital: f64 = parse_or(config, BACKTEST, "initial_capital", 100_000.0)?;
    check(
        initial_capital.is_finite() && initial_capital > 0.0,
        BACKTEST,
        "initial_capital",
        "initial_capital must be a finite positive number",
    )?;

    let risk_free_rate: f64 = parse_or(config, BACKTEST, "risk_free_rate", 0.02)?;
    check(
        (0.0..1.0).contains(&risk_free_rate),
        BACKTEST,
        "risk_free_rate",
        "risk_free_rate must be between 0 and 1",
    )?;

    let max_positions: usize = parse_or(config, RISK, "max_positions", 15)?;
    check(
        max_positions >= 1,
        RISK,
        "max_positions",
        "max_positions must be at least 1",
    )?;

    let defaults = ExitRules::default();
    let stop_loss_pct: f64 = parse_or(config, RISK, "stop_loss_pct", defaults.stop_loss_pct)?;
    check(
        stop_loss_pct > 0.0 && stop_loss_pct < 1.0,
        RISK,
        "stop_loss_pct",
        "stop_loss_pct must be between 0 and 1",
    )?;

    let trailing_stop_pct: f64 =
        parse_or(config, RISK, "trailing_stop_pct", defaults.trailing_stop_pct)?;
    check(
        trailing_stop_pct > 0.0 && trailing_stop_pct < 1.0,
        RISK,
        "trailing_stop_pct",
        "trailing_stop_pct must be between 0 and 1",
    )?;

    let take_profit_multiple: f64 = parse_or(
        config,
        RISK,
        "take_profit_multiple",
        defaults.take_profit_multiple,
    )?;
    check(
        take_profit_multiple.is_finite() && take_profit_multiple > 0.0,
        RISK,
        "take_profit_multiple",
        "take_profit_multiple must be a finite positive number",
    )?;

    let atr_stop_multiple: f64 =
        parse_or(config, RISK, "atr_stop_multiple", defaults.atr_stop_multiple)?;
    check(
        atr_stop_multiple.is_finite() && atr_stop_multiple >= 0.0,
        RISK,
        "atr_stop_multiple",
        "atr_stop_multiple must be finite and non-negative",
    )?;

    let sizing: SizingTable = parse_or(config, RISK, "position_sizing_table", SizingTable::default())?;

    let max_entries_per_day: usize = parse_or(config, RISK, "max_entries_per_day", 7)?;
    check(
        max_entries_per_day >= 1,
        RISK,
        "max_entries_per_day",
        "max_entries_per_day must be at least 1",
    )?;

    let rotation_period_days: u32 = parse_or(config, ROTATION, "rotation_period_days", 7)?;
    check(
        rotation_period_days >= 1,
        ROTATION,
        "rotation_period_days",
        "rotation_period_days must be at least 1",
    )?;
    let rotation_weekday = parse_weekday(config)?;

    let min_dollar_volume: f64 =
        parse_or(config, ROTATION, "min_dollar_volume", DEFAULT_MIN_DOLLAR_VOLUME)?;
    check(
        min_dollar_volume.is_finite() && min_dollar_volume >= 0.0,
        ROTATION,
        "min_dollar_volume",
        "min_dollar_volume must be finite and non-negative",
    )?;

    let ml_enabled = config.get_bool(GATE, "ml_enabled", false)?;
    let ml_probability_threshold: f64 = parse_or(config, GATE, "ml_probability_threshold", 0.55)?;
    check(
        (0.0..=1.0).contains(&ml_probability_threshold),
        GATE,
        "ml_probability_threshold",
        "ml_probability_threshold must be between 0 and 1",
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital,
        risk_free_rate,
        max_positions,
        max_entries_per_day,
        exit_rules: ExitRules {
            stop_loss_pct,
            trailing_stop_pct,
            take_profit_multiple,
            atr_stop_multiple,
        },
        sizing,
        rotation_period_days,
        rotation_weekday,
        ranker: RankerConfig { min_dollar_volume },
        ml_enabled,
        ml_probability_threshold,
    })
}

pub fn load_data_settings(config: &dyn ConfigPort) -> Result<DataSettings, RegimeTraderError> {
    let index_symbol = config
        .get_string(BACKTEST, "index_symbol")
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_else(|| "SPY".to_string());
    check(
        !index_symbol.is_empty(),
        BACKTEST,
        "index_symbol",
        "index_symbol must not be empty",
    )?;

    let symbols = match config.get_string(BACKTEST, "symbols") {
        Some(raw) if !raw.trim().is_empty() => Some(
            parse_symbols(&raw)
                .map_err(|e| RegimeTraderError::invalid(BACKTEST, "symbols", e.to_string()))?,
        ),
        _ => None,
    };

    let data_dir = config
        .get_string(BACKTEST, "data_dir")
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()));

    let lookback_days: u32 = parse_or(config, BACKTEST, "lookback_days", 0)?;

    Ok(DataSettings {
        index_symbol,
        symbols,
        data_dir,
        lookback_days,
    })
}

/// Path to the gate weight file; required only when the gate is enabled.
pub fn gate_model_path(config: &dyn ConfigPort) -> Result<Option<PathBuf>, RegimeTraderError> {
    if !config.get_bool(GATE, "ml_enabled", false)? {
        return Ok(None);
    }
    match config.get_string(GATE, "model_path") {
        Some(p) if !p.trim().is_empty() => Ok(Some(PathBuf::from(p.trim()))),
        _ => Err(RegimeTraderError::missing(GATE, "model_path")),
    }
}

/// Runs every check without building anything.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RegimeTraderError> {
    load_backtest_config(config)?;
    load_data_settings(config)?;
    gate_model_path(config)?;
    Ok(())
}
