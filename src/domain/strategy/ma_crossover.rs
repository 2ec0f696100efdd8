//! Moving-average crossover.
//!
//! Enter when SMA(short) crosses above SMA(long):
//!   short[t] > long[t] && short[t-1] <= long[t-1]
//! Exit on the symmetric downward cross. A bar where either average is
//! undefined at t or t-1 yields no signal.

use crate::domain::backtest::BacktestConfig;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::position::{PositionSeries, resolve_positions};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};

use super::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    pub allow_shorting: bool,
}

impl Default for MaCrossover {
    fn default() -> Self {
        MaCrossover {
            short_window: 10,
            long_window: 50,
            allow_shorting: false,
        }
    }
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        MaCrossover {
            short_window,
            long_window,
            allow_shorting: false,
        }
    }

    pub fn from_config(config: &BacktestConfig) -> Self {
        MaCrossover {
            short_window: config.short_window,
            long_window: config.long_window,
            allow_shorting: config.allow_shorting,
        }
    }

    fn largest_window(&self) -> usize {
        self.short_window.max(self.long_window)
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn required_bars(&self) -> usize {
        self.largest_window()
    }

    fn generate_signals(&self, price: &PriceSeries) -> SignalSeries {
        let short = calculate_sma(price, self.short_window);
        let long = calculate_sma(price, self.long_window);

        let signals = (0..price.len())
            .map(|t| {
                if t == 0 {
                    return Signal::Hold;
                }
                let averages = (short.get(t), long.get(t), short.get(t - 1), long.get(t - 1));
                match averages {
                    (Some(s), Some(l), Some(ps), Some(pl)) if s > l && ps <= pl => Signal::Enter,
                    (Some(s), Some(l), Some(ps), Some(pl)) if s < l && ps >= pl => Signal::Exit,
                    _ => Signal::Hold,
                }
            })
            .collect();

        // a crossover needs both averages at t-1
        SignalSeries::new(signals, self.largest_window())
    }

    fn resolve_positions(&self, _price: &PriceSeries, signals: &SignalSeries) -> PositionSeries {
        resolve_positions(signals, self.allow_shorting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::sma::calculate_sma;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn five_bar_scenario_averages() {
        let price = make_series(&[10.0, 10.0, 12.0, 9.0, 13.0]);
        let short = calculate_sma(&price, 2);
        let long = calculate_sma(&price, 3);

        assert_eq!(short.get(0), None);
        assert_abs_diff_eq!(short.get(1).unwrap(), 10.0);
        assert_abs_diff_eq!(short.get(2).unwrap(), 11.0);
        assert_abs_diff_eq!(short.get(3).unwrap(), 10.5);
        assert_abs_diff_eq!(short.get(4).unwrap(), 11.0);

        assert_eq!(long.get(1), None);
        assert_abs_diff_eq!(long.get(2).unwrap(), 10.6667, epsilon = 1e-4);
        assert_abs_diff_eq!(long.get(3).unwrap(), 10.3333, epsilon = 1e-4);
        assert_abs_diff_eq!(long.get(4).unwrap(), 11.3333, epsilon = 1e-4);
    }

    #[test]
    fn five_bar_scenario_crosses_down_at_bar_4() {
        // short 10.5 > long 10.33 at bar 3, short 11 < long 11.33 at bar 4
        let signals = MaCrossover::new(2, 3)
            .generate_signals(&make_series(&[10.0, 10.0, 12.0, 9.0, 13.0]));

        assert_eq!(signals.exits(), vec![false, false, false, false, true]);
        assert_eq!(signals.count(Signal::Enter), 0);
    }

    #[test]
    fn mirrored_scenario_enters_exactly_once_at_bar_4() {
        let signals = MaCrossover::new(2, 3)
            .generate_signals(&make_series(&[13.0, 13.0, 11.0, 14.0, 10.0]));

        assert_eq!(signals.entries(), vec![false, false, false, false, true]);
        assert_eq!(signals.count(Signal::Exit), 0);
    }

    #[test]
    fn no_signal_before_long_window() {
        let prices: Vec<f64> = (0..30)
            .map(|i| if i % 4 < 2 { 100.0 + i as f64 } else { 90.0 - i as f64 })
            .collect();
        let strategy = MaCrossover::new(3, 8);
        let signals = strategy.generate_signals(&make_series(&prices));

        for t in 0..strategy.long_window - 1 {
            assert_eq!(signals.get(t), Some(Signal::Hold), "signal at warm-up bar {t}");
        }
        assert_eq!(signals.warmup(), 8);
    }

    #[test]
    fn short_series_has_no_signals() {
        let signals = MaCrossover::default().generate_signals(&make_series(&[1.0, 2.0, 3.0]));
        assert_eq!(signals.len(), 3);
        assert_eq!(signals.count(Signal::Hold), 3);
    }

    #[test]
    fn positions_follow_crossovers() {
        let price = make_series(&[13.0, 13.0, 11.0, 14.0, 10.0, 20.0, 5.0, 4.0]);
        let strategy = MaCrossover::new(2, 3);
        let signals = strategy.generate_signals(&price);
        let positions = strategy.resolve_positions(&price, &signals);

        assert_eq!(positions.get(2), None);
        assert_eq!(positions.get(4), Some(1.0));
        assert_eq!(positions.len(), price.len());
    }

    #[test]
    fn shorting_flips_to_short_on_exit() {
        let price = make_series(&[10.0, 10.0, 12.0, 9.0, 13.0]);
        let strategy = MaCrossover {
            allow_shorting: true,
            ..MaCrossover::new(2, 3)
        };
        let signals = strategy.generate_signals(&price);
        let positions = strategy.resolve_positions(&price, &signals);
        assert_eq!(positions.get(4), Some(-1.0));
    }

    #[test]
    fn defaults() {
        let strategy = MaCrossover::default();
        assert_eq!(strategy.short_window, 10);
        assert_eq!(strategy.long_window, 50);
        assert_eq!(strategy.required_bars(), 50);
    }
}
