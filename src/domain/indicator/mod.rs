//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values aligned to a `PriceSeries`
//!
//! Every calculator takes a `&PriceSeries` and returns a fresh series; none
//! of them touch the bars they read.

pub mod atr;
pub mod rolling_max;
pub mod sma;
pub mod vwap;

use chrono::NaiveDateTime;
use std::fmt;

pub use vwap::VwapMode;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Atr(usize),
    Vwap(VwapMode),
    /// Highest high of the `n` bars before the current one.
    PriorHigh(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at bar `i`, or `None` during warm-up / when undefined.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values
            .get(i)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }

    /// Index of the first valid point.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Vwap(VwapMode::Rolling(window)) => write!(f, "VWAP({})", window),
            IndicatorType::Vwap(VwapMode::Cumulative) => write!(f, "VWAP(cumulative)"),
            IndicatorType::PriorHigh(window) => write!(f, "PRIOR_HIGH({})", window),
        }
    }
}
