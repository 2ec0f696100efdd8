//! Price data access port.

use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;

pub trait DataPort {
    /// Load the full, validated series for one instrument.
    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, BacktestError>;

    fn list_instruments(&self) -> Result<Vec<String>, BacktestError>;
}
