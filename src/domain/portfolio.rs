//! Portfolio state: cash pool, open positions, trade log and equity curve.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use super::position::{ExitReason, Position, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EntryRejected {
    #[error("position already open")]
    AlreadyOpen,
    #[error("max positions reached")]
    MaxPositions,
    #[error("insufficient cash")]
    InsufficientCash,
    #[error("non-positive allocation or price")]
    InvalidAllocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: BTreeMap<String, Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Debits `capital` and opens a position at `price`.
    pub fn open_position(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        price: f64,
        capital: f64,
        max_positions: usize,
    ) -> Result<&Position, EntryRejected> {
        if self.has_position(symbol) {
            return Err(EntryRejected::AlreadyOpen);
        }
        if self.positions.len() >= max_positions {
            return Err(EntryRejected::MaxPositions);
        }
        if !(capital > 0.0 && price > 0.0) {
            return Err(EntryRejected::InvalidAllocation);
        }
        if capital > self.cash {
            return Err(EntryRejected::InsufficientCash);
        }

        self.cash -= capital;
        let position = Position::open(symbol, date, price, capital);
        Ok(self.positions.entry(symbol.to_string()).or_insert(position))
    }

    /// Closes `symbol` at `price`, crediting principal plus pnl. A symbol
    /// with no open position is logged and ignored.
    pub fn close_position(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        price: f64,
        reason: ExitReason,
    ) -> Option<&Trade> {
        let Some(position) = self.positions.remove(symbol) else {
            warn!(symbol, %date, %reason, "exit requested for symbol with no open position");
            return None;
        };
        let trade = position.close(date, price, reason);
        self.cash += trade.allocated_capital + trade.pnl;
        self.trades.push(trade);
        self.trades.last()
    }

    /// Mark price for `symbol`, falling back to the entry price when no
    /// price has been observed.
    fn mark(position: &Position, prices: &HashMap<String, f64>) -> f64 {
        prices
            .get(&position.symbol)
            .copied()
            .unwrap_or(position.entry_price)
    }

    /// Σ allocated × price / entry over open positions.
    pub fn invested(&self, prices: &HashMap<String, f64>) -> f64 {
        self.positions
            .values()
            .map(|p| p.value_at(Self::mark(p, prices)))
            .sum()
    }

    pub fn total_equity(&self, prices: &HashMap<String, f64>) -> f64 {
        self.cash + self.invested(prices)
    }

    /// Invested fraction of equity; 0 when equity is not positive.
    pub fn exposure(&self, prices: &HashMap<String, f64>) -> f64 {
        let invested = self.invested(prices);
        let equity = self.cash + invested;
        if equity > 0.0 { invested / equity } else { 0.0 }
    }

    /// Open positions ordered weakest unrealized return first.
    pub fn weakest_first(&self, prices: &HashMap<String, f64>) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .positions
            .values()
            .map(|p| (p.symbol.clone(), p.unrealized_return(Self::mark(p, prices))))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }
}
