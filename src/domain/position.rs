//! Position lifecycle: open, daily stop/target evaluation, close.

use crate::domain::regime::Regime;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    ExposureCheck(Regime),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => f.write_str("Stop Loss"),
            ExitReason::TrailingStop => f.write_str("Trailing Stop"),
            ExitReason::TakeProfit => f.write_str("Take Profit"),
            ExitReason::ExposureCheck(regime) => write!(f, "Exposure Check (Regime {})", regime),
        }
    }
}

/// Stop and target parameters shared by every position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRules {
    pub stop_loss_pct: f64,
    pub trailing_stop_pct: f64,
    pub take_profit_multiple: f64,
    pub atr_stop_multiple: f64,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.05,
            trailing_stop_pct: 0.15,
            take_profit_multiple: 10.0,
            atr_stop_multiple: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub allocated_capital: f64,
    pub highest_price: f64,
    pub status: PositionStatus,
}

impl Position {
    pub fn open(symbol: impl Into<String>, date: NaiveDate, price: f64, capital: f64) -> Self {
        Self {
            symbol: symbol.into(),
            entry_date: date,
            entry_price: price,
            allocated_capital: capital,
            highest_price: price,
            status: PositionStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Marked-to-market value of the allocated capital.
    pub fn value_at(&self, price: f64) -> f64 {
        self.allocated_capital * price / self.entry_price
    }

    pub fn unrealized_return(&self, price: f64) -> f64 {
        price / self.entry_price - 1.0
    }

    /// Tighter of the fixed-percentage floor and the ATR-scaled floor.
    /// The ATR floor is ignored when ATR is unavailable or non-positive.
    pub fn hard_stop(&self, rules: &ExitRules, atr: Option<f64>) -> f64 {
        let pct_stop = self.entry_price * (1.0 - rules.stop_loss_pct);
        match atr {
            Some(atr) if atr > 0.0 => pct_stop.max(self.entry_price - rules.atr_stop_multiple * atr),
            _ => pct_stop,
        }
    }

    pub fn trailing_stop(&self, rules: &ExitRules) -> f64 {
        self.highest_price * (1.0 - rules.trailing_stop_pct)
    }

    pub fn take_profit_price(&self, rules: &ExitRules) -> f64 {
        self.entry_price * (1.0 + rules.take_profit_multiple)
    }

    /// Advances the high-water mark with `high`, then returns the exit
    /// price and reason if the day's range hit a stop or the target.
    /// Stops take precedence over the target.
    pub fn evaluate_exit(
        &mut self,
        high: f64,
        low: f64,
        atr: Option<f64>,
        rules: &ExitRules,
    ) -> Option<(f64, ExitReason)> {
        self.highest_price = self.highest_price.max(high);

        let hard = self.hard_stop(rules, atr);
        let trailing = self.trailing_stop(rules);
        let (stop, reason) = if trailing > hard {
            (trailing, ExitReason::TrailingStop)
        } else {
            (hard, ExitReason::StopLoss)
        };

        if low <= stop {
            return Some((stop, reason));
        }
        let target = self.take_profit_price(rules);
        if high >= target {
            return Some((target, ExitReason::TakeProfit));
        }
        None
    }

    /// Consumes the position into its trade record.
    pub fn close(mut self, date: NaiveDate, price: f64, reason: ExitReason) -> Trade {
        self.status = PositionStatus::Closed;
        let return_pct = self.unrealized_return(price);
        Trade {
            symbol: self.symbol,
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            allocated_capital: self.allocated_capital,
            highest_price: self.highest_price,
            exit_date: date,
            exit_price: price,
            pnl: return_pct * self.allocated_capital,
            return_pct,
            exit_reason: reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub allocated_capital: f64,
    pub highest_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub pnl: f64,
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn days_held(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }

    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}
