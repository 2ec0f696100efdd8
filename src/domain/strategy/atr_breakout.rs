//! ATR breakout with a ratcheting trailing stop.
//!
//! Raw entries are columnar: close[t] > max(high[t-N..t]) once ATR(period)
//! is defined. Turning them into positions needs state, so the trailing stop
//! is resolved by a single forward pass over a two-state machine:
//!
//! - `Flat` + entry → `Long { entry_price: close, stop: close - k*ATR }`
//! - `Long` → `stop = max(stop, close - k*ATR)`; close below stop → `Flat`
//!
//! The stop never decreases while a position is open. The pass is local to
//! one call; nothing is carried between runs.

use crate::domain::backtest::BacktestConfig;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::rolling_max::calculate_prior_high;
use crate::domain::position::PositionSeries;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};

use super::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct AtrBreakout {
    pub atr_period: usize,
    pub breakout_window: usize,
    pub atr_multiplier: f64,
}

impl Default for AtrBreakout {
    fn default() -> Self {
        AtrBreakout {
            atr_period: 14,
            breakout_window: 20,
            atr_multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrailState {
    Flat,
    Long { entry_price: f64, stop: f64 },
}

impl TrailState {
    /// Advance one bar. Returns the next state and the realized signal.
    pub fn advance(self, close: f64, atr: Option<f64>, breakout: bool, multiplier: f64) -> (TrailState, Signal) {
        match self {
            TrailState::Flat => match atr {
                Some(atr) if breakout => (
                    TrailState::Long {
                        entry_price: close,
                        stop: close - multiplier * atr,
                    },
                    Signal::Enter,
                ),
                _ => (TrailState::Flat, Signal::Hold),
            },
            TrailState::Long { entry_price, stop } => {
                let stop = match atr {
                    Some(atr) => stop.max(close - multiplier * atr),
                    None => stop,
                };
                if close < stop {
                    (TrailState::Flat, Signal::Exit)
                } else {
                    (TrailState::Long { entry_price, stop }, Signal::Hold)
                }
            }
        }
    }

    pub fn position(&self) -> f64 {
        match self {
            TrailState::Flat => 0.0,
            TrailState::Long { .. } => 1.0,
        }
    }

    pub fn stop(&self) -> Option<f64> {
        match self {
            TrailState::Flat => None,
            TrailState::Long { stop, .. } => Some(*stop),
        }
    }
}

/// Output of one trailing-stop pass, aligned with the price series.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingStopPass {
    pub positions: PositionSeries,
    /// Realized entries and stop-outs.
    pub signals: SignalSeries,
    /// Stop level in effect at the close of each bar while long.
    pub stops: Vec<Option<f64>>,
}

impl AtrBreakout {
    pub fn new(atr_period: usize, breakout_window: usize, atr_multiplier: f64) -> Self {
        AtrBreakout {
            atr_period,
            breakout_window,
            atr_multiplier,
        }
    }

    pub fn from_config(config: &BacktestConfig) -> Self {
        AtrBreakout {
            atr_period: config.atr_period,
            breakout_window: config.breakout_window,
            atr_multiplier: config.atr_multiplier,
        }
    }

    fn warmup(&self) -> usize {
        self.atr_period.saturating_sub(1).max(self.breakout_window)
    }

    /// Run the trailing-stop state machine over `price` once, in timestamp order.
    pub fn trail(&self, price: &PriceSeries, raw: &SignalSeries) -> TrailingStopPass {
        let atr = calculate_atr(price, self.atr_period);
        let warmup = raw.warmup();

        let mut state = TrailState::Flat;
        let mut positions = Vec::with_capacity(price.len());
        let mut signals = Vec::with_capacity(price.len());
        let mut stops = Vec::with_capacity(price.len());

        for (i, bar) in price.bars().iter().enumerate() {
            if i < warmup {
                positions.push(None);
                signals.push(Signal::Hold);
                stops.push(None);
                continue;
            }
            let breakout = raw.get(i) == Some(Signal::Enter);
            let (next, signal) = state.advance(bar.close, atr.get(i), breakout, self.atr_multiplier);
            state = next;
            positions.push(Some(state.position()));
            signals.push(signal);
            stops.push(state.stop());
        }

        TrailingStopPass {
            positions: PositionSeries::new(positions),
            signals: SignalSeries::new(signals, warmup),
            stops,
        }
    }
}

impl Strategy for AtrBreakout {
    fn name(&self) -> &str {
        "atr_breakout"
    }

    fn required_bars(&self) -> usize {
        self.atr_period.max(self.breakout_window)
    }

    fn generate_signals(&self, price: &PriceSeries) -> SignalSeries {
        let atr = calculate_atr(price, self.atr_period);
        let prior_high = calculate_prior_high(price, self.breakout_window);

        let signals = price
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| match (prior_high.get(i), atr.get(i)) {
                (Some(high), Some(_)) if bar.close > high => Signal::Enter,
                _ => Signal::Hold,
            })
            .collect();

        SignalSeries::new(signals, self.warmup())
    }

    fn resolve_positions(&self, price: &PriceSeries, signals: &SignalSeries) -> PositionSeries {
        self.trail(price, signals).positions
    }
}
