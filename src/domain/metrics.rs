//! Performance statistics from the trade log and equity curve.
//!
//! Every ratio returns 0 when its denominator is 0.

use super::portfolio::{EquityPoint, Portfolio};
use super::position::Trade;
use std::collections::BTreeMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub total_return: f64,
    pub final_equity: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_days_held: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub open_positions: usize,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den != 0.0 && den.is_finite() { num / den } else { 0.0 }
}

/// (final / initial)^(1/years) - 1.
pub fn cagr(initial: f64, final_equity: f64, years: f64) -> f64 {
    if initial <= 0.0 || years <= 0.0 || final_equity < 0.0 {
        return 0.0;
    }
    (final_equity / initial).powf(1.0 / years) - 1.0
}

fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

fn daily_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| ratio(w[1].equity - w[0].equity, w[0].equity))
        .collect()
}

/// Largest peak-to-trough decline as a positive fraction.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for point in curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd
}

fn max_streaks(trades: &[Trade]) -> (usize, usize) {
    let (mut wins, mut losses) = (0usize, 0usize);
    let (mut best_wins, mut best_losses) = (0usize, 0usize);
    for trade in trades {
        if trade.is_win() {
            wins += 1;
            losses = 0;
        } else {
            losses += 1;
            wins = 0;
        }
        best_wins = best_wins.max(wins);
        best_losses = best_losses.max(losses);
    }
    (best_wins, best_losses)
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, risk_free_rate: f64) -> Self {
        let curve = &portfolio.equity_curve;
        let trades = &portfolio.trades;
        let initial = portfolio.initial_capital;

        let final_equity = curve.last().map_or(initial, |p| p.equity);
        let total_return = ratio(final_equity - initial, initial);

        let years = match (curve.first(), curve.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR,
            _ => 0.0,
        };
        let cagr = cagr(initial, final_equity, years);

        let returns = daily_returns(curve);
        let volatility = sample_stddev(&returns) * TRADING_DAYS_PER_YEAR.sqrt();
        let negative: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside = sample_stddev(&negative) * TRADING_DAYS_PER_YEAR.sqrt();
        let max_drawdown = max_drawdown(curve);

        let wins: Vec<f64> = trades.iter().filter(|t| t.is_win()).map(|t| t.pnl).collect();
        let losses: Vec<f64> = trades
            .iter()
            .filter(|t| t.pnl < 0.0)
            .map(|t| t.pnl.abs())
            .collect();
        let gross_win: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum();
        let total_days: i64 = trades.iter().map(Trade::days_held).sum();
        let (max_consecutive_wins, max_consecutive_losses) = max_streaks(trades);

        Metrics {
            total_trades: trades.len(),
            trades_won: wins.len(),
            trades_lost: losses.len(),
            win_rate: ratio(wins.len() as f64, trades.len() as f64),
            total_return,
            final_equity,
            cagr,
            volatility,
            sharpe: ratio(cagr - risk_free_rate, volatility),
            sortino: ratio(cagr - risk_free_rate, downside),
            calmar: ratio(cagr, max_drawdown.abs()),
            max_drawdown,
            profit_factor: ratio(gross_win, gross_loss),
            avg_win: ratio(gross_win, wins.len() as f64),
            avg_loss: ratio(gross_loss, losses.len() as f64),
            avg_days_held: ratio(total_days as f64, trades.len() as f64),
            max_consecutive_wins,
            max_consecutive_losses,
            open_positions: portfolio.position_count(),
        }
    }

    /// Named metrics in report order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("total_trades", self.total_trades as f64),
            ("win_rate", self.win_rate),
            ("total_return", self.total_return),
            ("final_equity", self.final_equity),
            ("cagr", self.cagr),
            ("volatility", self.volatility),
            ("sharpe", self.sharpe),
            ("sortino", self.sortino),
            ("calmar", self.calmar),
            ("max_drawdown", self.max_drawdown),
            ("profit_factor", self.profit_factor),
            ("avg_win", self.avg_win),
            ("avg_loss", self.avg_loss),
            ("avg_days_held", self.avg_days_held),
            ("max_consecutive_wins", self.max_consecutive_wins as f64),
            ("max_consecutive_losses", self.max_consecutive_losses as f64),
            ("open_positions", self.open_positions as f64),
        ]
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.entries().into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolResult {
    pub symbol: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
}

impl SymbolResult {
    /// One summary per traded symbol, sorted by symbol.
    pub fn compute_per_symbol(trades: &[Trade]) -> Vec<SymbolResult> {
        let mut grouped: BTreeMap<&str, (usize, usize, f64)> = BTreeMap::new();
        for trade in trades {
            let entry = grouped.entry(trade.symbol.as_str()).or_default();
            entry.0 += 1;
            if trade.is_win() {
                entry.1 += 1;
            }
            entry.2 += trade.pnl;
        }
        grouped
            .into_iter()
            .map(|(symbol, (total, won, pnl))| SymbolResult {
                symbol: symbol.to_string(),
                total_trades: total,
                winning_trades: won,
                win_rate: ratio(won as f64, total as f64),
                total_pnl: pnl,
            })
            .collect()
    }
}

/// Trade counts keyed by exit reason label.
pub fn exit_reason_counts(trades: &[Trade]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for trade in trades {
        *counts.entry(trade.exit_reason.to_string()).or_insert(0) += 1;
    }
    counts
}
