mod common;

use common::*;
use proptest::prelude::*;
use regimetrader::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use regimetrader::domain::error::RegimeTraderError;
use regimetrader::domain::features::compute_features;
use regimetrader::domain::metrics::{cagr, Metrics};
use regimetrader::domain::portfolio::Portfolio;
use regimetrader::domain::position::ExitReason;
use regimetrader::domain::regime::Regime;
use regimetrader::domain::risk::reconcile_exposure;
use regimetrader::domain::universe::{load_universe, SkipReason, Universe};
use regimetrader::ports::candidate_gate::CandidateGate;
use std::collections::HashMap;

fn universe_from(port: &MockDataPort, symbols: &[&str]) -> Universe {
    let symbols = symbols.iter().map(|s| s.to_string()).collect();
    load_universe(port, symbols, "SPY", 0).unwrap()
}

/// Entry at 100 on `ENTRY_INDEX`, then a 0.4% daily climb.
fn take_profit_port() -> MockDataPort {
    let count = ENTRY_INDEX + 120;
    MockDataPort::new()
        .with_bars("AAA", geometric_bars(count, ENTRY_INDEX, 100.0, 0.004))
        .with_bars("SPY", index_bars(count))
}

/// Entry at 100, a climb to a 150 high, then a day whose low is 127.
fn trailing_stop_port() -> MockDataPort {
    let mut bars = geometric_bars(ENTRY_INDEX + 1, ENTRY_INDEX, 100.0, 0.004);
    for k in 1..=24 {
        let close = 100.0 + 2.0 * k as f64;
        bars.push(bar(ENTRY_INDEX + k, close - 1.0, close + 1.0, close - 1.0, close));
    }
    bars.push(bar(ENTRY_INDEX + 25, 149.0, 150.0, 148.0, 149.0));
    bars.push(bar(ENTRY_INDEX + 26, 149.0, 149.0, 127.0, 128.0));
    for k in 27..40 {
        bars.push(bar(ENTRY_INDEX + k, 128.0, 129.0, 127.0, 128.0));
    }
    let count = bars.len();
    MockDataPort::new()
        .with_bars("AAA", bars)
        .with_bars("SPY", index_bars(count))
}

fn trailing_config() -> BacktestConfig {
    BacktestConfig::with_dates(day(ENTRY_INDEX), day(ENTRY_INDEX + 26))
}

/// Open positions at the close of `date`, rebuilt from the trade log.
fn open_at_close(result: &BacktestResult, date: chrono::NaiveDate) -> usize {
    let closed = result
        .portfolio
        .trades
        .iter()
        .filter(|t| t.entry_date <= date && t.exit_date > date)
        .count();
    let open = result
        .portfolio
        .positions
        .values()
        .filter(|p| p.entry_date <= date)
        .count();
    closed + open
}

fn assert_cash_conserved(result: &BacktestResult) {
    let portfolio = &result.portfolio;
    let realised: f64 = portfolio.trades.iter().map(|t| t.pnl).sum();
    let committed: f64 = portfolio.positions.values().map(|p| p.allocated_capital).sum();
    let expected = portfolio.initial_capital + realised - committed;
    assert!(
        (portfolio.cash - expected).abs() < 1e-6,
        "cash {} != {}",
        portfolio.cash,
        expected
    );
}

mod scenarios {
    use super::*;

    #[test]
    fn take_profit_exit_books_target_gain() {
        let port = take_profit_port();
        let bars = &port.data["AAA"];
        let target = 100.0 * (1.0 + 0.30);
        let exit_offset = (1..120)
            .find(|k| bars[ENTRY_INDEX + k].high >= target)
            .unwrap();

        let universe = universe_from(&port, &["AAA"]);
        let mut config =
            BacktestConfig::with_dates(day(ENTRY_INDEX), day(ENTRY_INDEX + exit_offset));
        config.exit_rules.take_profit_multiple = 0.30;

        let result = run_backtest(&universe, &config, None).unwrap();
        let trade = &result.portfolio.trades[0];

        assert_eq!(result.portfolio.trades.len(), 1);
        assert_eq!(trade.symbol, "AAA");
        assert_eq!(trade.entry_date, day(ENTRY_INDEX));
        assert_eq!(trade.exit_date, day(ENTRY_INDEX + exit_offset));
        assert!((trade.entry_price - 100.0).abs() < 1e-9);
        assert!((trade.allocated_capital - 25_000.0).abs() < 1e-9);
        assert!((trade.exit_price - 130.0).abs() < 1e-9);
        assert!((trade.pnl - 7_500.0).abs() < 1e-6);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);

        let final_equity = result.portfolio.equity_curve.last().unwrap().equity;
        assert!((final_equity - 107_500.0).abs() < 1e-6);
        assert_cash_conserved(&result);

        let metrics = Metrics::compute(&result.portfolio, config.risk_free_rate);
        assert_eq!(metrics.total_trades, 1);
        assert!((metrics.win_rate - 1.0).abs() < f64::EPSILON);
        assert!((metrics.total_return - 0.075).abs() < 1e-9);
    }

    #[test]
    fn trailing_stop_binds_above_hard_stop() {
        let port = trailing_stop_port();
        let universe = universe_from(&port, &["AAA"]);
        let result = run_backtest(&universe, &trailing_config(), None).unwrap();

        let trade = &result.portfolio.trades[0];
        assert_eq!(trade.entry_date, day(ENTRY_INDEX));
        assert_eq!(trade.exit_date, day(ENTRY_INDEX + 26));
        assert!((trade.highest_price - 150.0).abs() < 1e-9);
        assert!((trade.exit_price - 127.5).abs() < 1e-9);
        assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
        assert_eq!(trade.exit_reason.to_string(), "Trailing Stop");
        assert!((trade.pnl - 6_875.0).abs() < 1e-6);
        assert_cash_conserved(&result);
    }

    #[test]
    fn cagr_doubling_over_two_years() {
        assert!((cagr(100_000.0, 200_000.0, 2.0) - (2f64.sqrt() - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn open_positions_are_left_open_at_range_end() {
        let port = take_profit_port();
        let universe = universe_from(&port, &["AAA"]);
        let config = BacktestConfig::with_dates(day(ENTRY_INDEX), day(ENTRY_INDEX + 10));

        let result = run_backtest(&universe, &config, None).unwrap();

        assert!(result.portfolio.trades.is_empty());
        assert!(result.portfolio.has_position("AAA"));
        let metrics = Metrics::compute(&result.portfolio, config.risk_free_rate);
        assert_eq!(metrics.open_positions, 1);
        assert!(metrics.final_equity > 100_000.0);
    }
}

mod degraded_data {
    use super::*;

    #[test]
    fn missing_index_forces_regime_c_and_blocks_entries() {
        let count = ENTRY_INDEX + 40;
        let port = MockDataPort::new().with_bars("AAA", geometric_bars(count, ENTRY_INDEX, 100.0, 0.004));
        let universe = universe_from(&port, &["AAA"]);
        assert!(universe.index.is_none());

        let config = BacktestConfig::with_dates(day(ENTRY_INDEX), day(ENTRY_INDEX + 30));
        let result = run_backtest(&universe, &config, None).unwrap();

        assert_eq!(result.regime_days.get(&Regime::C), Some(&result.dates_processed));
        assert!(result.portfolio.trades.is_empty());
        assert_eq!(result.portfolio.position_count(), 0);
    }

    #[test]
    fn failing_and_short_symbols_are_skipped() {
        let count = ENTRY_INDEX + 40;
        let port = MockDataPort::new()
            .with_bars("AAA", geometric_bars(count, ENTRY_INDEX, 100.0, 0.004))
            .with_bars("SHORT", geometric_bars(50, 49, 10.0, 0.001))
            .with_bars("SPY", index_bars(count))
            .with_error("BAD", "connection reset");

        let universe = universe_from(&port, &["AAA", "BAD", "SHORT", "GONE", "SPY"]);

        assert_eq!(universe.count(), 1);
        let reasons: HashMap<&str, &SkipReason> = universe
            .skipped
            .iter()
            .map(|s| (s.symbol.as_str(), &s.reason))
            .collect();
        assert!(matches!(reasons["BAD"], SkipReason::FetchFailed(_)));
        assert!(matches!(reasons["SHORT"], SkipReason::InsufficientBars { bars: 50 }));
        assert!(matches!(reasons["GONE"], SkipReason::NoData));
        assert!(!reasons.contains_key("SPY"));
        assert!(universe.index.is_some());

        let config = BacktestConfig::with_dates(day(ENTRY_INDEX), day(ENTRY_INDEX + 30));
        assert!(run_backtest(&universe, &config, None).is_ok());
    }

    #[test]
    fn no_usable_symbols_is_an_error() {
        let port = MockDataPort::new().with_bars("SPY", index_bars(300));
        let err = load_universe(&port, vec!["NOPE".to_string()], "SPY", 0).unwrap_err();
        assert!(matches!(err, RegimeTraderError::InsufficientData { .. }));
    }
}

mod gate {
    use super::*;

    fn run_with_gate(gate: &dyn CandidateGate) -> Result<BacktestResult, RegimeTraderError> {
        let port = trailing_stop_port();
        let universe = universe_from(&port, &["AAA"]);
        let config = BacktestConfig {
            ml_enabled: true,
            ..trailing_config()
        };
        run_backtest(&universe, &config, Some(gate))
    }

    #[test]
    fn confident_gate_matches_ungated_run() {
        let port = trailing_stop_port();
        let universe = universe_from(&port, &["AAA"]);
        let ungated = run_backtest(&universe, &trailing_config(), None).unwrap();

        let gated = run_with_gate(&FixedGate::new(0.9)).unwrap();

        assert_eq!(gated.portfolio.trades, ungated.portfolio.trades);
        assert_eq!(gated.gate_rejections, 0);
    }

    #[test]
    fn probability_at_threshold_is_rejected() {
        let result = run_with_gate(&FixedGate::new(0.55)).unwrap();
        assert!(result.portfolio.trades.is_empty());
        assert_eq!(result.portfolio.position_count(), 0);
        assert!(result.gate_rejections > 0);
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let result = run_with_gate(&FixedGate::new(1.5)).unwrap();
        assert!(result.portfolio.trades.is_empty());
        assert!(result.gate_rejections > 0);
    }

    #[test]
    fn schema_mismatch_stops_the_run() {
        let mut gate = FixedGate::new(0.9);
        gate.names.reverse();
        let err = run_with_gate(&gate).unwrap_err();
        assert!(matches!(err, RegimeTraderError::GateSchema { .. }));
        assert_eq!(err.exit_status(), 6);
    }

    #[test]
    fn disabled_gate_is_never_consulted() {
        let port = trailing_stop_port();
        let universe = universe_from(&port, &["AAA"]);
        let result = run_backtest(&universe, &trailing_config(), Some(&FixedGate::new(0.0))).unwrap();
        assert_eq!(result.portfolio.trades.len(), 1);
        assert_eq!(result.gate_rejections, 0);
    }
}

mod properties {
    use super::*;

    fn wavy_universe(params: &[(f64, f64, f64)], index_amp: f64) -> (Universe, Vec<&'static str>) {
        const NAMES: [&str; 6] = ["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"];
        let count = ENTRY_INDEX + 150;
        let mut port = MockDataPort::new().with_bars("SPY", wavy_bars(count, 100.0, 0.0004, index_amp, 9.0));
        let names: Vec<&'static str> = NAMES.iter().copied().take(params.len()).collect();
        for (name, &(growth, amplitude, period)) in names.iter().zip(params) {
            port = port.with_bars(name, wavy_bars(count, 20.0, growth, amplitude, period));
        }
        let universe = universe_from(&port, &names);
        (universe, names)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn open_positions_never_exceed_limit(
            params in prop::collection::vec((0.0005f64..0.006, 0.0f64..0.08, 3.0f64..15.0), 2..6),
            index_amp in 0.0f64..0.05,
            max_positions in 1usize..4,
        ) {
            let (universe, _) = wavy_universe(&params, index_amp);
            let mut config = BacktestConfig::with_dates(day(ENTRY_INDEX), day(ENTRY_INDEX + 140));
            config.max_positions = max_positions;
            config.ranker.min_dollar_volume = 0.0;

            let result = run_backtest(&universe, &config, None).unwrap();

            for point in &result.portfolio.equity_curve {
                prop_assert!(open_at_close(&result, point.date) <= max_positions);
            }
            assert_cash_conserved(&result);
            for trade in &result.portfolio.trades {
                let expected = (trade.exit_price / trade.entry_price - 1.0) * trade.allocated_capital;
                prop_assert!((trade.pnl - expected).abs() < 1e-6);
            }
        }

        #[test]
        fn reconcile_leaves_exposure_within_cap(
            moves in prop::collection::vec((10.0f64..200.0, 0.3f64..2.5), 1..10),
            regime_idx in 0usize..3,
        ) {
            let regime = [Regime::A, Regime::B, Regime::C][regime_idx];
            let start = day(0);
            let mut portfolio = Portfolio::new(100_000.0);
            let mut prices = HashMap::new();
            let capital = 100_000.0 / (moves.len() as f64 + 1.0);
            for (i, &(entry, factor)) in moves.iter().enumerate() {
                let symbol = format!("S{i}");
                portfolio.open_position(&symbol, start, entry, capital, 20).unwrap();
                prices.insert(symbol, entry * factor);
            }

            reconcile_exposure(&mut portfolio, &prices, regime, day(1));

            prop_assert!(portfolio.exposure(&prices) <= regime.exposure_cap() + 1e-9);
        }

        #[test]
        fn features_ignore_later_bars(
            returns in prop::collection::vec(-0.04f64..0.04, 280..320),
            cut in 200usize..270,
            shock in 0.5f64..2.0,
        ) {
            let mut close = 50.0;
            let bars: Vec<OhlcvBar> = returns
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    close *= 1.0 + r;
                    bar(i, close, close * 1.01, close * 0.99, close)
                })
                .collect();
            let mut altered = bars.clone();
            for b in altered.iter_mut().skip(cut + 1) {
                b.open *= shock;
                b.high *= shock;
                b.low *= shock;
                b.close *= shock;
                b.volume *= 3;
            }

            let original = compute_features(&bars);
            let changed = compute_features(&altered);
            prop_assert_eq!(&original[..=cut], &changed[..=cut]);
        }
    }
}
