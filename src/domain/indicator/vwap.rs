//! Volume-weighted average price of closes.
//!
//! Rolling(n): sum(C*V over last n bars) / sum(V over last n bars), first (n-1) bars invalid.
//! Cumulative: running sums from the first bar.
//! A zero volume denominator leaves the point invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VwapMode {
    Rolling(usize),
    Cumulative,
}

impl VwapMode {
    /// Bars needed before the first point can be valid.
    pub fn window(&self) -> usize {
        match self {
            VwapMode::Rolling(window) => *window,
            VwapMode::Cumulative => 1,
        }
    }
}

pub fn calculate_vwap(price: &PriceSeries, mode: VwapMode) -> IndicatorSeries {
    let bars = price.bars();
    let mut values = Vec::with_capacity(bars.len());
    let mut cum_notional = 0.0;
    let mut cum_volume = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let (notional, volume) = match mode {
            VwapMode::Cumulative => {
                cum_notional += bar.notional();
                cum_volume += bar.volume;
                (cum_notional, cum_volume)
            }
            VwapMode::Rolling(window) if window > 0 && i + 1 >= window => {
                let slice = &bars[i + 1 - window..=i];
                (
                    slice.iter().map(|b| b.notional()).sum::<f64>(),
                    slice.iter().map(|b| b.volume).sum::<f64>(),
                )
            }
            VwapMode::Rolling(_) => (0.0, 0.0),
        };

        let valid = volume > 0.0;
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: if valid { notional / volume } else { 0.0 },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Vwap(mode),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};

    fn make_series(cv: &[(f64, f64)]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = cv
            .iter()
            .enumerate()
            .map(|(i, &(close, volume))| OhlcvBar {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn rolling_vwap_weights_by_volume() {
        let series = calculate_vwap(
            &make_series(&[(10.0, 1.0), (20.0, 3.0), (30.0, 1.0)]),
            VwapMode::Rolling(2),
        );
        assert_eq!(series.get(0), None);
        // (10*1 + 20*3) / 4 = 17.5
        assert_abs_diff_eq!(series.get(1).unwrap(), 17.5, epsilon = 1e-12);
        // (20*3 + 30*1) / 4 = 22.5
        assert_abs_diff_eq!(series.get(2).unwrap(), 22.5, epsilon = 1e-12);
    }

    #[test]
    fn cumulative_vwap_from_first_bar() {
        let series = calculate_vwap(
            &make_series(&[(10.0, 1.0), (20.0, 3.0), (30.0, 1.0)]),
            VwapMode::Cumulative,
        );
        assert_abs_diff_eq!(series.get(0).unwrap(), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(series.get(2).unwrap(), 100.0 / 5.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_volume_window_is_invalid() {
        let series = calculate_vwap(
            &make_series(&[(10.0, 0.0), (20.0, 0.0), (30.0, 2.0)]),
            VwapMode::Rolling(2),
        );
        assert_eq!(series.get(1), None);
        assert_abs_diff_eq!(series.get(2).unwrap(), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn cumulative_zero_volume_prefix_is_invalid() {
        let series = calculate_vwap(
            &make_series(&[(10.0, 0.0), (20.0, 2.0)]),
            VwapMode::Cumulative,
        );
        assert_eq!(series.get(0), None);
        assert_abs_diff_eq!(series.get(1).unwrap(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn mode_window() {
        assert_eq!(VwapMode::Rolling(14).window(), 14);
        assert_eq!(VwapMode::Cumulative.window(), 1);
    }
}
