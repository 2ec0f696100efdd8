//! CSV file data adapter.
//!
//! One file per instrument, `<instrument>.csv`, with a header row naming
//! `timestamp,open,high,low,close,volume` (any order, extra columns ignored).
//! Rows are taken in file order; validation happens in [`PriceSeries::new`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::DataPort;

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

#[derive(Debug)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", instrument))
    }
}

/// `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d`, or epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}

fn data_error(reason: String) -> BacktestError {
    BacktestError::Data { reason }
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, BacktestError> {
        let path = self.csv_path(instrument);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| data_error(format!("CSV header error in {}: {}", path.display(), e)))?
            .clone();

        let mut index = [0usize; 6];
        for (slot, name) in index.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    data_error(format!("{}: missing {} column", path.display(), name))
                })?;
        }

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;

            let field = |col: usize| -> Result<&str, BacktestError> {
                record.get(index[col]).ok_or_else(|| {
                    data_error(format!("row {}: missing {} value", row + 1, COLUMNS[col]))
                })
            };
            let number = |col: usize| -> Result<f64, BacktestError> {
                field(col)?.parse::<f64>().map_err(|e| {
                    data_error(format!("row {}: invalid {} value: {}", row + 1, COLUMNS[col], e))
                })
            };

            let raw_ts = field(0)?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
                data_error(format!("row {}: invalid timestamp '{}'", row + 1, raw_ts))
            })?;

            bars.push(OhlcvBar {
                timestamp,
                open: number(1)?,
                high: number(2)?,
                low: number(3)?,
                close: number(4)?,
                volume: number(5)?,
            });
        }

        PriceSeries::new(instrument, bars)
    }

    fn list_instruments(&self) -> Result<Vec<String>, BacktestError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut instruments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv")
                && let Some(stem) = path.file_stem()
            {
                instruments.push(stem.to_string_lossy().into_owned());
            }
        }

        instruments.sort();
        Ok(instruments)
    }
}
