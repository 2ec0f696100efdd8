//! VWAP mean reversion.
//!
//! deviation = (close - vwap) / vwap
//! Enter when deviation < -threshold, exit (or reverse short) when
//! deviation > threshold. Bars with no usable VWAP yield no signal.

use crate::domain::backtest::BacktestConfig;
use crate::domain::indicator::vwap::{VwapMode, calculate_vwap};
use crate::domain::position::{PositionSeries, resolve_positions};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};

use super::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct VwapReversion {
    pub mode: VwapMode,
    pub threshold: f64,
    pub allow_shorting: bool,
}

impl Default for VwapReversion {
    fn default() -> Self {
        VwapReversion {
            mode: VwapMode::Rolling(14),
            threshold: 0.02,
            allow_shorting: false,
        }
    }
}

impl VwapReversion {
    pub fn new(mode: VwapMode, threshold: f64) -> Self {
        VwapReversion {
            mode,
            threshold,
            allow_shorting: false,
        }
    }

    pub fn from_config(config: &BacktestConfig) -> Self {
        VwapReversion {
            mode: config.vwap_mode(),
            threshold: config.threshold,
            allow_shorting: config.allow_shorting,
        }
    }
}

impl Strategy for VwapReversion {
    fn name(&self) -> &str {
        "vwap_reversion"
    }

    fn required_bars(&self) -> usize {
        self.mode.window()
    }

    fn generate_signals(&self, price: &PriceSeries) -> SignalSeries {
        let vwap = calculate_vwap(price, self.mode);

        let signals = price
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| match vwap.get(i) {
                Some(v) if v != 0.0 => {
                    let deviation = (bar.close - v) / v;
                    if deviation < -self.threshold {
                        Signal::Enter
                    } else if deviation > self.threshold {
                        Signal::Exit
                    } else {
                        Signal::Hold
                    }
                }
                _ => Signal::Hold,
            })
            .collect();

        SignalSeries::new(signals, self.mode.window().saturating_sub(1))
    }

    fn resolve_positions(&self, _price: &PriceSeries, signals: &SignalSeries) -> PositionSeries {
        resolve_positions(signals, self.allow_shorting)
    }
}
