//! Date-stepped simulation loop.
//!
//! Per date, in order: regime from the index row, focus-list rotation on
//! schedule boundaries, stop/target management of open positions, exposure
//! reconciliation, gated entries from the focus list, equity snapshot.

use chrono::{NaiveDate, Weekday};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::domain::breadth::{compute_breadth, Breadth};
use crate::domain::error::RegimeTraderError;
use crate::domain::features::FeatureRow;
use crate::domain::gate_features::{validate_gate_schema, GateFeatures};
use crate::domain::portfolio::Portfolio;
use crate::domain::position::ExitRules;
use crate::domain::ranker::{rank_candidates, FocusList, RankerConfig, RotationSchedule};
use crate::domain::regime::{classify, Regime, SizingTable};
use crate::domain::risk::reconcile_exposure;
use crate::domain::series::{build_unified_timeline, SymbolSeries};
use crate::domain::universe::Universe;
use crate::ports::candidate_gate::CandidateGate;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
    pub max_positions: usize,
    pub max_entries_per_day: usize,
    pub exit_rules: ExitRules,
    pub sizing: SizingTable,
    pub rotation_period_days: u32,
    pub rotation_weekday: Option<Weekday>,
    pub ranker: RankerConfig,
    pub ml_enabled: bool,
    pub ml_probability_threshold: f64,
}

impl BacktestConfig {
    /// Default parameters over the given date range.
    pub fn with_dates(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            initial_capital: 100_000.0,
            risk_free_rate: 0.02,
            max_positions: 15,
            max_entries_per_day: 7,
            exit_rules: ExitRules::default(),
            sizing: SizingTable::default(),
            rotation_period_days: 7,
            rotation_weekday: Some(Weekday::Mon),
            ranker: RankerConfig::default(),
            ml_enabled: false,
            ml_probability_threshold: 0.55,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub dates_processed: usize,
    pub rotations: usize,
    pub forced_liquidations: usize,
    pub gate_rejections: usize,
    pub regime_days: HashMap<Regime, usize>,
}

struct Candidate<'a> {
    symbol: &'a str,
    close: f64,
    score: f64,
}

/// Runs the simulation over `config`'s date range. The universe must be
/// fully loaded; the loop performs no I/O.
pub fn run_backtest(
    universe: &Universe,
    config: &BacktestConfig,
    gate: Option<&dyn CandidateGate>,
) -> Result<BacktestResult, RegimeTraderError> {
    let gate = match (config.ml_enabled, gate) {
        (true, Some(g)) => {
            validate_gate_schema(g)?;
            Some(g)
        }
        (true, None) => {
            return Err(RegimeTraderError::Gate {
                reason: "gate enabled but no model loaded".to_string(),
            });
        }
        (false, _) => None,
    };

    let timeline: Vec<NaiveDate> = build_unified_timeline(&universe.series)
        .into_iter()
        .filter(|d| *d >= config.start_date && *d <= config.end_date)
        .collect();
    if timeline.is_empty() {
        return Err(RegimeTraderError::NoData {
            symbol: format!("{}..{}", config.start_date, config.end_date),
        });
    }

    info!(
        symbols = universe.count(),
        dates = timeline.len(),
        start = %config.start_date,
        end = %config.end_date,
        gate = gate.is_some(),
        "running backtest"
    );

    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut schedule = RotationSchedule::new(config.rotation_period_days, config.rotation_weekday);
    let mut focus = FocusList::default();
    let mut last_close: HashMap<String, f64> = HashMap::new();
    let mut previous_regime: Option<Regime> = None;
    let mut rotations = 0usize;
    let mut forced_liquidations = 0usize;
    let mut gate_rejections = 0usize;
    let mut regime_days: HashMap<Regime, usize> = HashMap::new();
    let lookup: HashMap<&str, &SymbolSeries> = universe
        .series
        .iter()
        .map(|s| (s.symbol(), s))
        .collect();

    for &date in &timeline {
        for series in &universe.series {
            if let Some(row) = series.at(date) {
                last_close.insert(series.symbol().to_string(), row.close);
            }
        }

        let index_row = universe.index.as_ref().and_then(|s| s.as_of(date));
        let regime = classify(index_row);
        if previous_regime != Some(regime) {
            info!(%date, %regime, "regime change");
            previous_regime = Some(regime);
        }
        *regime_days.entry(regime).or_insert(0) += 1;

        if schedule.is_boundary(date, focus.is_empty()) {
            focus = rank_candidates(&universe.series, index_row, regime, date, &config.ranker);
            schedule.mark(date);
            rotations += 1;
            debug!(%date, %regime, candidates = focus.len(), "rotation");
        }

        manage_positions(&mut portfolio, &lookup, date, &config.exit_rules);

        forced_liquidations += reconcile_exposure(&mut portfolio, &last_close, regime, date);

        gate_rejections += enter_positions(
            &mut portfolio,
            universe,
            &lookup,
            &focus,
            index_row,
            regime,
            date,
            config,
            gate,
        );

        let equity = portfolio.total_equity(&last_close);
        portfolio.record_equity(date, equity);
    }

    info!(
        trades = portfolio.trades.len(),
        open = portfolio.position_count(),
        final_equity = portfolio.equity_curve.last().map_or(config.initial_capital, |p| p.equity),
        rotations,
        forced_liquidations,
        "backtest complete"
    );

    Ok(BacktestResult {
        portfolio,
        dates_processed: timeline.len(),
        rotations,
        forced_liquidations,
        gate_rejections,
        regime_days,
    })
}

fn manage_positions(
    portfolio: &mut Portfolio,
    lookup: &HashMap<&str, &SymbolSeries>,
    date: NaiveDate,
    rules: &ExitRules,
) {
    let open: Vec<String> = portfolio.positions.keys().cloned().collect();
    for symbol in open {
        let Some(row) = lookup.get(symbol.as_str()).and_then(|s| s.at(date)) else {
            continue;
        };
        let exit = portfolio
            .positions
            .get_mut(&symbol)
            .and_then(|p| p.evaluate_exit(row.high, row.low, row.atr14, rules));
        if let Some((price, reason)) = exit {
            if let Some(trade) = portfolio.close_position(&symbol, date, price, reason) {
                info!(
                    %symbol,
                    %date,
                    %reason,
                    price,
                    pnl = trade.pnl,
                    "exit"
                );
            }
        }
    }
}

/// Scores focus-list candidates and opens the best of them. Returns the
/// number of candidates the gate rejected.
#[allow(clippy::too_many_arguments)]
fn enter_positions(
    portfolio: &mut Portfolio,
    universe: &Universe,
    lookup: &HashMap<&str, &SymbolSeries>,
    focus: &FocusList,
    index_row: Option<&FeatureRow>,
    regime: Regime,
    date: NaiveDate,
    config: &BacktestConfig,
    gate: Option<&dyn CandidateGate>,
) -> usize {
    if focus.is_empty() {
        return 0;
    }
    let mut breadth: Option<Breadth> = None;
    let mut rejected = 0;
    let mut candidates: Vec<Candidate<'_>> = Vec::new();

    for entry in focus.entries() {
        if portfolio.has_position(&entry.symbol) {
            continue;
        }
        let Some(row) = lookup.get(entry.symbol.as_str()).and_then(|s| s.at(date)) else {
            continue;
        };
        if !row.ema21.is_some_and(|ema| row.close > ema) {
            continue;
        }

        let score = match gate {
            None => 1.0,
            Some(g) => {
                let snapshot = *breadth.get_or_insert_with(|| compute_breadth(&universe.series, date));
                let features = GateFeatures::build(row, index_row, &snapshot);
                match g.predict(&features) {
                    Ok(p) if (0.0..=1.0).contains(&p) && p > config.ml_probability_threshold => p,
                    Ok(p) => {
                        debug!(symbol = %entry.symbol, %date, probability = p, "gate rejected");
                        rejected += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!(symbol = %entry.symbol, %date, error = %e, "gate failed, candidate rejected");
                        rejected += 1;
                        continue;
                    }
                }
            }
        };
        candidates.push(Candidate {
            symbol: &entry.symbol,
            close: row.close,
            score,
        });
    }

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let size_pct = config.sizing.position_size_pct(regime);
    for candidate in candidates.into_iter().take(config.max_entries_per_day) {
        let capital = portfolio.cash * size_pct;
        match portfolio.open_position(
            candidate.symbol,
            date,
            candidate.close,
            capital,
            config.max_positions,
        ) {
            Ok(_) => info!(
                symbol = candidate.symbol,
                %date,
                %regime,
                price = candidate.close,
                capital,
                score = candidate.score,
                "entry"
            ),
            Err(reason) => debug!(symbol = candidate.symbol, %date, %reason, "entry rejected"),
        }
    }

    rejected
}
