//! Strategy contract and the built-in strategies.
//!
//! A strategy is a pure function of a `PriceSeries`: `generate_signals`
//! produces raw signals and `resolve_positions` turns them into the position
//! series the simulator consumes. Metrics are shared and live in
//! [`crate::domain::metrics`], not on the strategy.

pub mod atr_breakout;
pub mod ma_crossover;
pub mod vwap_reversion;

use std::fmt;
use std::str::FromStr;

use super::backtest::{self, BacktestConfig, BacktestResult};
use super::error::BacktestError;
use super::position::{PositionSeries, resolve_positions};
use super::price_series::PriceSeries;
use super::signal::SignalSeries;

pub use atr_breakout::AtrBreakout;
pub use ma_crossover::MaCrossover;
pub use vwap_reversion::VwapReversion;

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Largest configured window. Shorter series are rejected by the pipeline.
    fn required_bars(&self) -> usize;

    fn generate_signals(&self, price: &PriceSeries) -> SignalSeries;

    fn resolve_positions(&self, _price: &PriceSeries, signals: &SignalSeries) -> PositionSeries {
        resolve_positions(signals, false)
    }

    fn run_backtest(
        &self,
        price: &PriceSeries,
        config: &BacktestConfig,
    ) -> Result<BacktestResult, BacktestError> {
        backtest::run_backtest(self, price, config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    MaCrossover,
    VwapReversion,
    AtrBreakout,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::MaCrossover,
        StrategyKind::VwapReversion,
        StrategyKind::AtrBreakout,
    ];

    pub fn build(&self, config: &BacktestConfig) -> Box<dyn Strategy> {
        match self {
            StrategyKind::MaCrossover => Box::new(MaCrossover::from_config(config)),
            StrategyKind::VwapReversion => Box::new(VwapReversion::from_config(config)),
            StrategyKind::AtrBreakout => Box::new(AtrBreakout::from_config(config)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::MaCrossover => write!(f, "ma_crossover"),
            StrategyKind::VwapReversion => write!(f, "vwap_reversion"),
            StrategyKind::AtrBreakout => write!(f, "atr_breakout"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ma_crossover" | "sma_crossover" | "sma_cross" => Ok(StrategyKind::MaCrossover),
            "vwap_reversion" | "vwap" => Ok(StrategyKind::VwapReversion),
            "atr_breakout" | "atr" => Ok(StrategyKind::AtrBreakout),
            other => Err(format!(
                "unknown strategy '{}' (expected ma_crossover, vwap_reversion or atr_breakout)",
                other
            )),
        }
    }
}
