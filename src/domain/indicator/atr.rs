//! Average True Range as a simple rolling mean of true range.
//!
//! TR[0] = high - low (no previous close); TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR(n)[i] = mean(TR[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;

pub fn true_ranges(price: &PriceSeries) -> Vec<f64> {
    let bars = price.bars();
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(price: &PriceSeries, period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: vec![],
        };
    }

    let tr_values = true_ranges(price);
    let mut results = Vec::with_capacity(tr_values.len());

    for (i, bar) in price.bars().iter().enumerate() {
        let valid = i + 1 >= period;
        let value = if valid {
            tr_values[i + 1 - period..=i].iter().sum::<f64>() / period as f64
        } else {
            0.0
        };
        results.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};

    fn make_series(hlc: &[(f64, f64, f64)]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = hlc
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close))| OhlcvBar {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn atr_warmup() {
        let series = calculate_atr(&make_series(&[(110.0, 90.0, 100.0); 5]), 3);
        assert_eq!(series.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn first_true_range_is_high_minus_low() {
        let tr = true_ranges(&make_series(&[(110.0, 100.0, 105.0), (130.0, 120.0, 125.0)]));
        assert_abs_diff_eq!(tr[0], 10.0);
        // gap up: |130 - 105| = 25
        assert_abs_diff_eq!(tr[1], 25.0);
    }

    #[test]
    fn atr_is_rolling_mean_not_wilder() {
        let series = calculate_atr(
            &make_series(&[
                (110.0, 100.0, 105.0),
                (115.0, 105.0, 110.0),
                (120.0, 110.0, 115.0),
                (140.0, 110.0, 135.0),
            ]),
            3,
        );
        // TR = [10, 10, 10, 30]
        assert_abs_diff_eq!(series.get(2).unwrap(), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(series.get(3).unwrap(), 50.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn atr_insufficient_bars_stays_aligned() {
        let series = calculate_atr(&make_series(&[(110.0, 90.0, 100.0); 2]), 5);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_valid(), None);
    }
}
