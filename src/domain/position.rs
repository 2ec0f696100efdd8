//! Realized position series and the generic signal resolver.
//!
//! A position is the signed exposure in effect during a bar: `1.0` long,
//! `0.0` flat, `-1.0` short. `None` marks bars before the upstream signal
//! finished warming up.

use super::signal::{Signal, SignalSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSeries {
    values: Vec<Option<f64>>,
}

impl PositionSeries {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    /// A fully defined series, convenient for hand-built positions.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            values: values.iter().copied().map(Some).collect(),
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    /// Whether bar `i` carries a defined, non-zero position.
    pub fn is_exposed(&self, i: usize) -> bool {
        matches!(self.get(i), Some(p) if p != 0.0)
    }

    pub fn exposed_bars(&self) -> usize {
        (0..self.values.len()).filter(|&i| self.is_exposed(i)).count()
    }
}

/// Resolve raw signals into positions without any strategy-specific state.
///
/// `Enter` goes long, `Exit` goes flat (or short when `allow_shorting`),
/// `Hold` carries the previous position forward. Warm-up bars stay undefined.
pub fn resolve_positions(signals: &SignalSeries, allow_shorting: bool) -> PositionSeries {
    let exit_position = if allow_shorting { -1.0 } else { 0.0 };
    let mut current = 0.0;

    let values = signals
        .signals()
        .iter()
        .enumerate()
        .map(|(i, signal)| {
            if i < signals.warmup() {
                return None;
            }
            current = match signal {
                Signal::Enter => 1.0,
                Signal::Exit => exit_position,
                Signal::Hold => current,
            };
            Some(current)
        })
        .collect();

    PositionSeries { values }
}
