//! Highest high of the `n` bars strictly before the current bar.
//!
//! PRIOR_HIGH(n)[i] = max(H[i-n..i]). Warmup: first n bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;

pub fn calculate_prior_high(price: &PriceSeries, window: usize) -> IndicatorSeries {
    let bars = price.bars();
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = window > 0 && i >= window;
            let value = if valid {
                bars[i - window..i]
                    .iter()
                    .map(|b| b.high)
                    .fold(f64::NEG_INFINITY, f64::max)
            } else {
                0.0
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::PriorHigh(window),
        values,
    }
}
