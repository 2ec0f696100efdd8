//! Immutable, validated price history for one instrument.
//!
//! Construction is the only place bar ordering and volume sign are checked;
//! every later stage can rely on a `PriceSeries` being well formed. Bars are
//! never mutated after construction: indicators and signals are returned as
//! new series aligned to the same index.

use chrono::NaiveDateTime;

use super::error::BacktestError;
use super::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    instrument: String,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    /// Validate and wrap `bars`.
    ///
    /// Fails with `MalformedSeries` on the first bar whose timestamp does not
    /// strictly increase, whose volume is negative, or whose prices are not
    /// finite. The bars are never re-ordered.
    pub fn new(instrument: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, BacktestError> {
        let instrument = instrument.into();

        for (i, bar) in bars.iter().enumerate() {
            let malformed = |reason: String| BacktestError::MalformedSeries {
                instrument: instrument.clone(),
                index: i,
                reason,
            };

            if ![bar.open, bar.high, bar.low, bar.close].iter().all(|v| v.is_finite()) {
                return Err(malformed("non-finite price".into()));
            }
            if !bar.volume.is_finite() || bar.volume < 0.0 {
                return Err(malformed(format!("negative or non-finite volume {}", bar.volume)));
            }
            if i > 0 {
                let prev = bars[i - 1].timestamp;
                if bar.timestamp == prev {
                    return Err(malformed(format!("duplicate timestamp {}", bar.timestamp)));
                }
                if bar.timestamp < prev {
                    return Err(malformed(format!(
                        "timestamp {} precedes {}",
                        bar.timestamp, prev
                    )));
                }
            }
        }

        Ok(Self { instrument, bars })
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// The first `len` bars as a new series. A prefix of a valid series is valid.
    pub fn prefix(&self, len: usize) -> PriceSeries {
        PriceSeries {
            instrument: self.instrument.clone(),
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }
}
