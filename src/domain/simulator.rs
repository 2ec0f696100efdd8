//! Portfolio simulation: positions + prices → equity curve.
//!
//! With delay d and slippage s:
//!   exec[t]  = close[t-d] * (1 + s)
//!   value[t] = (initial + Σ_{k<=t} position[k-d] * (exec[k] - exec[k-1])) * (1 - commission)
//!
//! Slippage is always adverse and direction-blind, and commission scales the
//! whole curve once rather than per trade. A bar whose term is undefined
//! (before the delayed price difference exists, or while the delayed position
//! is still warming up) has NaN equity. Equity at bar t reads nothing after t.

use chrono::NaiveDateTime;

use super::error::BacktestError;
use super::position::PositionSeries;
use super::price_series::PriceSeries;

/// Execution and cost assumptions.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub execution_delay_bars: usize,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            initial_capital: 10_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.001,
            execution_delay_bars: 1,
        }
    }
}

impl CostModel {
    /// close * (1 + slippage_rate)
    pub fn executed_price(&self, close: f64) -> f64 {
        close * (1.0 + self.slippage_rate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquitySeries {
    points: Vec<EquityPoint>,
}

impl EquitySeries {
    pub fn new(points: Vec<EquityPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.points.get(i).map(|p| p.equity)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Defined (non-NaN) equity values in bar order.
    pub fn defined_values(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.equity)
            .filter(|v| !v.is_nan())
            .collect()
    }

    pub fn last_defined(&self) -> Option<f64> {
        self.points.iter().rev().map(|p| p.equity).find(|v| !v.is_nan())
    }
}

pub fn simulate(
    price: &PriceSeries,
    positions: &PositionSeries,
    cost: &CostModel,
) -> Result<EquitySeries, BacktestError> {
    if positions.len() != price.len() {
        return Err(BacktestError::MalformedSeries {
            instrument: price.instrument().to_string(),
            index: positions.len().min(price.len()),
            reason: format!(
                "position series has {} bars, price series has {}",
                positions.len(),
                price.len()
            ),
        });
    }
    let delay = cost.execution_delay_bars;
    if delay == 0 {
        return Err(BacktestError::ConfigInvalid {
            section: "backtest".into(),
            key: "execution_delay_bars".into(),
            reason: "execution_delay_bars must be at least 1".into(),
        });
    }

    let bars = price.bars();
    let scale = 1.0 - cost.commission_rate;
    let mut running = 0.0;
    let mut points = Vec::with_capacity(bars.len());

    for (t, bar) in bars.iter().enumerate() {
        let term = if t > delay {
            let delta = cost.executed_price(bars[t - delay].close)
                - cost.executed_price(bars[t - delay - 1].close);
            positions.get(t - delay).map(|p| p * delta)
        } else {
            None
        };

        let equity = match term {
            Some(pnl) => {
                running += pnl;
                (cost.initial_capital + running) * scale
            }
            None => f64::NAN,
        };

        points.push(EquityPoint {
            timestamp: bar.timestamp,
            equity,
        });
    }

    Ok(EquitySeries { points })
}
