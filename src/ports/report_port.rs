//! Report output port.

use std::path::Path;

use crate::domain::backtest::{BacktestResult, InstrumentRun};
use crate::domain::error::BacktestError;

/// Consumer of metrics records and equity curves.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), BacktestError>;

    /// Default implementation: writes each successful run on its own.
    fn write_batch(
        &self,
        strategy: &str,
        runs: &[InstrumentRun],
        output_dir: &Path,
    ) -> Result<(), BacktestError> {
        let _ = strategy;
        for run in runs {
            if let Ok(result) = &run.outcome {
                self.write(result, output_dir)?;
            }
        }
        Ok(())
    }
}
