//! Backtest pipeline: signals → positions → equity → metrics.
//!
//! Every run is a pure function of its inputs. Batches fan out across
//! instruments with rayon and keep each instrument's outcome separate.

use log::{debug, info, warn};
use rayon::prelude::*;

use super::error::BacktestError;
use super::indicator::VwapMode;
use super::metrics::MetricsRecord;
use super::position::PositionSeries;
use super::price_series::PriceSeries;
use super::signal::{Signal, SignalSeries};
use super::simulator::{CostModel, EquitySeries, simulate};
use super::strategy::Strategy;

/// Strategy parameters plus execution assumptions for one backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub vwap_window: usize,
    pub vwap_cumulative: bool,
    pub threshold: f64,
    pub atr_period: usize,
    pub breakout_window: usize,
    pub atr_multiplier: f64,
    pub allow_shorting: bool,
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub execution_delay_bars: usize,
    /// Annualization factor for the Sharpe ratio. Has no default: 252 for
    /// daily bars, 252 * 390 for US-session minute bars, and so on.
    pub periods_per_year: f64,
}

impl BacktestConfig {
    pub fn new(periods_per_year: f64) -> Self {
        let cost = CostModel::default();
        BacktestConfig {
            short_window: 10,
            long_window: 50,
            vwap_window: 14,
            vwap_cumulative: false,
            threshold: 0.02,
            atr_period: 14,
            breakout_window: 20,
            atr_multiplier: 3.0,
            allow_shorting: false,
            initial_capital: cost.initial_capital,
            commission_rate: cost.commission_rate,
            slippage_rate: cost.slippage_rate,
            execution_delay_bars: cost.execution_delay_bars,
            periods_per_year,
        }
    }

    pub fn vwap_mode(&self) -> VwapMode {
        if self.vwap_cumulative {
            VwapMode::Cumulative
        } else {
            VwapMode::Rolling(self.vwap_window)
        }
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel {
            initial_capital: self.initial_capital,
            commission_rate: self.commission_rate,
            slippage_rate: self.slippage_rate,
            execution_delay_bars: self.execution_delay_bars,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: String,
    pub instrument: String,
    pub signals: SignalSeries,
    pub positions: PositionSeries,
    pub equity: EquitySeries,
    pub metrics: MetricsRecord,
}

impl BacktestResult {
    pub fn final_equity(&self) -> Option<f64> {
        self.equity.last_defined()
    }
}

/// Outcome for one instrument of a batch.
#[derive(Debug)]
pub struct InstrumentRun {
    pub instrument: String,
    pub outcome: Result<BacktestResult, BacktestError>,
}

pub fn run_backtest<S: Strategy + ?Sized>(
    strategy: &S,
    price: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    let minimum = strategy.required_bars();
    if price.len() < minimum {
        return Err(BacktestError::InsufficientData {
            instrument: price.instrument().to_string(),
            bars: price.len(),
            minimum,
        });
    }

    let signals = strategy.generate_signals(price);
    debug!(
        "{} {}: {} entries, {} exits over {} bars (warm-up {})",
        strategy.name(),
        price.instrument(),
        signals.count(Signal::Enter),
        signals.count(Signal::Exit),
        signals.len(),
        signals.warmup()
    );

    let positions = strategy.resolve_positions(price, &signals);
    debug!(
        "{} {}: exposed on {} of {} bars",
        strategy.name(),
        price.instrument(),
        positions.exposed_bars(),
        positions.len()
    );

    let equity = simulate(price, &positions, &config.cost_model())?;
    debug!(
        "{} {}: final equity {:?}",
        strategy.name(),
        price.instrument(),
        equity.last_defined()
    );

    let metrics = MetricsRecord::compute(&equity, &positions, config.periods_per_year);

    Ok(BacktestResult {
        strategy: strategy.name().to_string(),
        instrument: price.instrument().to_string(),
        signals,
        positions,
        equity,
        metrics,
    })
}

/// Run one strategy over many instruments in parallel.
///
/// Outcomes come back in input order. A failing instrument is logged and
/// reported in its slot; it never aborts the others.
pub fn run_batch<S: Strategy + ?Sized>(
    strategy: &S,
    series: &[PriceSeries],
    config: &BacktestConfig,
) -> Vec<InstrumentRun> {
    info!(
        "Running {} over {} instruments",
        strategy.name(),
        series.len()
    );

    let runs: Vec<InstrumentRun> = series
        .par_iter()
        .map(|price| InstrumentRun {
            instrument: price.instrument().to_string(),
            outcome: run_backtest(strategy, price, config),
        })
        .collect();

    let failed = runs.iter().filter(|run| run.outcome.is_err()).count();
    for run in &runs {
        if let Err(e) = &run.outcome {
            warn!("Excluding {}: {}", run.instrument, e);
        }
    }
    info!(
        "{}: {} of {} instruments completed",
        strategy.name(),
        runs.len() - failed,
        runs.len()
    );

    runs
}
