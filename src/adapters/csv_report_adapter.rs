//! CSV report adapter implementing ReportPort.
//!
//! Per strategy run it writes:
//! - `<strategy>_metrics.csv`: one row per instrument, the six metric columns
//!   plus an `error` column for excluded instruments
//! - `<strategy>_<instrument>_equity.csv`: bar-by-bar equity and position
//! - `<strategy>_summary.csv`: instruments ranked by total return
//!
//! Undefined values are written as `NaN`.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::domain::backtest::{BacktestResult, InstrumentRun};
use crate::domain::error::BacktestError;
use crate::domain::metrics::{METRIC_NAMES, MetricsRecord};
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn csv_error(e: csv::Error) -> BacktestError {
    BacktestError::Io(std::io::Error::other(e))
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, BacktestError> {
    let data = wtr.into_inner().map_err(|e| BacktestError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|e| BacktestError::Io(std::io::Error::other(e)))
}

fn metric_fields(metrics: &MetricsRecord) -> Vec<String> {
    metrics
        .as_pairs()
        .iter()
        .map(|(_, v)| format!("{:.6}", v))
        .collect()
}

/// Metrics table: `instrument,<six metrics>,error`.
pub fn metrics_csv(runs: &[InstrumentRun]) -> Result<String, BacktestError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["instrument"];
    header.extend(METRIC_NAMES);
    header.push("error");
    wtr.write_record(&header).map_err(csv_error)?;

    for run in runs {
        let mut record = vec![run.instrument.clone()];
        match &run.outcome {
            Ok(result) => {
                record.extend(metric_fields(&result.metrics));
                record.push(String::new());
            }
            Err(e) => {
                record.extend(METRIC_NAMES.iter().map(|_| String::new()));
                record.push(e.to_string());
            }
        }
        wtr.write_record(&record).map_err(csv_error)?;
    }

    finish(wtr)
}

/// Equity curve: `timestamp,position,equity`.
pub fn equity_csv(result: &BacktestResult) -> Result<String, BacktestError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "position", "equity"])
        .map_err(csv_error)?;

    for (i, point) in result.equity.points().iter().enumerate() {
        let position = result
            .positions
            .get(i)
            .map(|p| p.to_string())
            .unwrap_or_default();
        wtr.write_record([
            point.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            position,
            format!("{:.2}", point.equity),
        ])
        .map_err(csv_error)?;
    }

    finish(wtr)
}

/// Successful runs ordered by total return, best first. NaN sorts last.
pub fn rank_by_total_return(runs: &[InstrumentRun]) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = runs
        .iter()
        .filter_map(|run| {
            run.outcome
                .as_ref()
                .ok()
                .map(|r| (run.instrument.clone(), r.metrics.total_return))
        })
        .collect();

    ranked.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.1.total_cmp(&a.1),
    });
    ranked
}

pub fn summary_csv(runs: &[InstrumentRun]) -> Result<String, BacktestError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["rank", "instrument", "total_return"])
        .map_err(csv_error)?;
    for (i, (instrument, total_return)) in rank_by_total_return(runs).iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            instrument.clone(),
            format!("{:.6}", total_return),
        ])
        .map_err(csv_error)?;
    }
    finish(wtr)
}

fn write_file(output_dir: &Path, name: &str, content: &str) -> Result<(), BacktestError> {
    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join(name), content)?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), BacktestError> {
        write_file(
            output_dir,
            &format!("{}_{}_equity.csv", result.strategy, result.instrument),
            &equity_csv(result)?,
        )
    }

    fn write_batch(
        &self,
        strategy: &str,
        runs: &[InstrumentRun],
        output_dir: &Path,
    ) -> Result<(), BacktestError> {
        for run in runs {
            if let Ok(result) = &run.outcome {
                self.write(result, output_dir)?;
            }
        }
        write_file(
            output_dir,
            &format!("{}_metrics.csv", strategy),
            &metrics_csv(runs)?,
        )?;
        write_file(
            output_dir,
            &format!("{}_summary.csv", strategy),
            &summary_csv(runs)?,
        )
    }
}
