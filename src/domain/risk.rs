//! Portfolio-wide exposure enforcement.

use crate::domain::portfolio::Portfolio;
use crate::domain::position::ExitReason;
use crate::domain::regime::Regime;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

/// Force-closes the weakest open positions at `prices` until exposure is
/// within the regime cap. Returns the number of positions closed.
pub fn reconcile_exposure(
    portfolio: &mut Portfolio,
    prices: &HashMap<String, f64>,
    regime: Regime,
    date: NaiveDate,
) -> usize {
    let cap = regime.exposure_cap();
    let mut closed = 0;

    while portfolio.exposure(prices) > cap {
        let Some((symbol, unrealized)) = portfolio.weakest_first(prices).into_iter().next() else {
            break;
        };
        let price = match prices.get(&symbol) {
            Some(&p) => p,
            None => portfolio.positions.get(&symbol).map_or(0.0, |p| p.entry_price),
        };
        info!(
            %symbol,
            %date,
            %regime,
            unrealized,
            exposure = portfolio.exposure(prices),
            cap,
            "forced liquidation"
        );
        portfolio.close_position(&symbol, date, price, ExitReason::ExposureCheck(regime));
        closed += 1;
    }

    closed
}
