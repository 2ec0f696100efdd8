#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use stratbench::domain::backtest::BacktestConfig;
use stratbench::domain::error::BacktestError;
pub use stratbench::domain::ohlcv::OhlcvBar;
use stratbench::domain::price_series::PriceSeries;
use stratbench::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, instrument: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, BacktestError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(instrument) {
            Some(bars) => PriceSeries::new(instrument, bars.clone()),
            None => Err(BacktestError::Data {
                reason: format!("no data for {}", instrument),
            }),
        }
    }

    fn list_instruments(&self) -> Result<Vec<String>, BacktestError> {
        let mut instruments: Vec<String> = self.data.keys().cloned().collect();
        instruments.sort();
        Ok(instruments)
    }
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// One-minute bars with a 1.0 range around each close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            timestamp: start_time() + Duration::minutes(i as i64),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000.0 + (i % 7) as f64 * 100.0,
        })
        .collect()
}

pub fn series_from_closes(instrument: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(instrument, bars_from_closes(closes)).unwrap()
}

/// Trending sine wave: enough swings to trigger every strategy.
pub fn wave_closes(count: usize, start_price: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            start_price + (t * 0.15).sin() * 8.0 + (t * 0.05).cos() * 3.0 + t * 0.04
        })
        .collect()
}

pub fn generate_series(instrument: &str, count: usize, start_price: f64) -> PriceSeries {
    series_from_closes(instrument, &wave_closes(count, start_price))
}

/// Small windows so short synthetic series are long enough.
pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        short_window: 5,
        long_window: 20,
        vwap_window: 10,
        threshold: 0.01,
        atr_period: 7,
        breakout_window: 10,
        atr_multiplier: 2.0,
        ..BacktestConfig::new(252.0)
    }
}

/// CSV text in the layout the CSV adapter reads.
pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for bar in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    out
}
