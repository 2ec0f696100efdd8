//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Metric bounds: drawdown <= 0, win rate in [0, 1], exposure in [0, 100]
//! 2. Ratchet monotonicity: a trailing stop never falls while long
//! 3. Causality: changing bars or positions after t never changes equity at t
//! 4. Position domain: long-only strategies stay in {0, 1}

mod common;

use common::*;
use proptest::prelude::*;
use stratbench::domain::backtest::BacktestConfig;
use stratbench::domain::position::PositionSeries;
use stratbench::domain::price_series::PriceSeries;
use stratbench::domain::simulator::{CostModel, simulate};
use stratbench::domain::strategy::{AtrBreakout, Strategy as BacktestStrategy, StrategyKind};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, 40..160)
        .prop_map(|v| v.into_iter().map(|p| (p * 100.0).round() / 100.0).collect())
}

fn arb_walk() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-3.0..3.0_f64, 40..160).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .map(|s| {
                price = (price + s).max(1.0);
                price
            })
            .collect()
    })
}

fn config() -> BacktestConfig {
    BacktestConfig {
        short_window: 3,
        long_window: 12,
        vwap_window: 8,
        threshold: 0.01,
        atr_period: 5,
        breakout_window: 8,
        atr_multiplier: 1.5,
        ..BacktestConfig::new(252.0)
    }
}

fn replace_tail(price: &PriceSeries, cutoff: usize, tail: &[f64]) -> PriceSeries {
    let bars = price
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i <= cutoff {
                bar.clone()
            } else {
                let close = tail[i % tail.len()];
                OhlcvBar {
                    open: close,
                    high: close + 2.0,
                    low: close - 2.0,
                    close,
                    volume: 10.0,
                    ..bar.clone()
                }
            }
        })
        .collect();
    PriceSeries::new(price.instrument(), bars).unwrap()
}

// ── 1. Metric bounds ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn metrics_stay_in_bounds(closes in arb_closes()) {
        let price = series_from_closes("P", &closes);
        let config = config();

        for kind in StrategyKind::ALL {
            let result = kind.build(&config).run_backtest(&price, &config).unwrap();
            let m = &result.metrics;
            prop_assert!(m.max_drawdown <= 0.0);
            prop_assert!((0.0..=1.0).contains(&m.win_rate));
            prop_assert!((0.0..=100.0).contains(&m.exposure_time));
        }
    }
}

// ── 2. Ratchet monotonicity ──────────────────────────────────────────

proptest! {
    #[test]
    fn trailing_stop_never_loosens(closes in arb_walk()) {
        let price = series_from_closes("P", &closes);
        let strategy = AtrBreakout::new(5, 8, 1.5);
        let pass = strategy.trail(&price, &strategy.generate_signals(&price));

        for t in 1..pass.stops.len() {
            if let (Some(prev), Some(curr)) = (pass.stops[t - 1], pass.stops[t]) {
                prop_assert!(curr >= prev, "stop fell from {} to {} at bar {}", prev, curr, t);
            }
        }
    }

    #[test]
    fn long_only_positions_are_zero_or_one(closes in arb_walk()) {
        let price = series_from_closes("P", &closes);
        let config = config();

        for kind in StrategyKind::ALL {
            let result = kind.build(&config).run_backtest(&price, &config).unwrap();
            for p in result.positions.values().iter().flatten() {
                prop_assert!(*p == 0.0 || *p == 1.0);
            }
        }
    }
}

// ── 3. Causality ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn future_bars_never_change_the_past(
        closes in arb_walk(),
        tail in prop::collection::vec(1.0..500.0_f64, 1..10),
        cut in 0.0..1.0_f64,
    ) {
        let price = series_from_closes("P", &closes);
        let cutoff = ((price.len() - 1) as f64 * cut) as usize;
        let altered = replace_tail(&price, cutoff, &tail);
        let config = config();

        for kind in StrategyKind::ALL {
            let strategy = kind.build(&config);
            let a = strategy.run_backtest(&price, &config).unwrap();
            let b = strategy.run_backtest(&altered, &config).unwrap();

            prop_assert_eq!(&a.positions.values()[..=cutoff], &b.positions.values()[..=cutoff]);
            let ea = a.equity.values();
            let eb = b.equity.values();
            for t in 0..=cutoff {
                prop_assert_eq!(ea[t].to_bits(), eb[t].to_bits(), "{} equity differs at bar {}", kind, t);
            }
        }
    }
}

fn arb_positions() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(
        prop_oneof![Just(None), Just(Some(-1.0)), Just(Some(0.0)), Just(Some(1.0))],
        160,
    )
}

proptest! {
    #[test]
    fn future_positions_never_change_past_equity(
        closes in arb_walk(),
        before in arb_positions(),
        after in arb_positions(),
        cut in 0.0..1.0_f64,
        delay in 1usize..4,
    ) {
        let price = series_from_closes("P", &closes);
        let n = price.len();
        let cutoff = ((n - 1) as f64 * cut) as usize;
        let spliced: Vec<Option<f64>> = (0..n)
            .map(|i| if i <= cutoff { before[i] } else { after[i] })
            .collect();
        let cost = CostModel {
            execution_delay_bars: delay,
            ..CostModel::default()
        };

        let a = simulate(&price, &PositionSeries::new(before[..n].to_vec()), &cost).unwrap();
        let b = simulate(&price, &PositionSeries::new(spliced), &cost).unwrap();

        let ea = a.values();
        let eb = b.values();
        for t in 0..=cutoff {
            prop_assert_eq!(ea[t].to_bits(), eb[t].to_bits(), "equity differs at bar {}", t);
        }
    }
}
