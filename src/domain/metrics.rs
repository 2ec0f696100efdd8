//! Performance metrics over an equity curve and its position series.
//!
//! Period returns are simple returns between consecutive defined equity
//! values. A metric whose denominator vanishes is reported as NaN and logged;
//! it never aborts the run.

use log::warn;

use super::error::DegenerateMetric;
use super::position::PositionSeries;
use super::simulator::EquitySeries;

/// The six metric names, stable across strategies.
pub const METRIC_NAMES: [&str; 6] = [
    "total_return",
    "sharpe_ratio",
    "max_drawdown",
    "win_rate",
    "expectancy",
    "exposure_time",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecord {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub expectancy: f64,
    /// Percentage of bars, 0..=100.
    pub exposure_time: f64,
}

impl MetricsRecord {
    pub fn compute(equity: &EquitySeries, positions: &PositionSeries, periods_per_year: f64) -> Self {
        let values = equity.defined_values();
        let returns = period_returns(&values);

        let win_rate = win_rate(&returns);

        MetricsRecord {
            total_return: absorb(total_return(&values)),
            sharpe_ratio: absorb(sharpe_ratio(&returns, periods_per_year)),
            max_drawdown: max_drawdown(&values),
            win_rate,
            expectancy: absorb(expectancy(&returns, win_rate)),
            exposure_time: exposure_time(positions),
        }
    }

    /// (name, value) pairs in [`METRIC_NAMES`] order.
    pub fn as_pairs(&self) -> [(&'static str, f64); 6] {
        [
            (METRIC_NAMES[0], self.total_return),
            (METRIC_NAMES[1], self.sharpe_ratio),
            (METRIC_NAMES[2], self.max_drawdown),
            (METRIC_NAMES[3], self.win_rate),
            (METRIC_NAMES[4], self.expectancy),
            (METRIC_NAMES[5], self.exposure_time),
        ]
    }

    /// Names of metrics that came out undefined.
    pub fn undefined_metrics(&self) -> Vec<&'static str> {
        self.as_pairs()
            .iter()
            .filter(|(_, v)| v.is_nan())
            .map(|(name, _)| *name)
            .collect()
    }
}

pub fn compute_metrics(
    equity: &EquitySeries,
    positions: &PositionSeries,
    periods_per_year: f64,
) -> MetricsRecord {
    MetricsRecord::compute(equity, positions, periods_per_year)
}

fn absorb(result: Result<f64, DegenerateMetric>) -> f64 {
    result.unwrap_or_else(|degenerate| {
        warn!("{degenerate}");
        f64::NAN
    })
}

fn period_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn total_return(values: &[f64]) -> Result<f64, DegenerateMetric> {
    let mut positive = values.iter().copied().filter(|v| *v > 0.0);
    let first = positive.next();
    let last = positive.last().or(first);
    match (first, last) {
        (Some(first), Some(last)) => Ok(last / first - 1.0),
        _ => Err(DegenerateMetric {
            metric: "total_return",
            reason: "no strictly positive equity value",
        }),
    }
}

fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> Result<f64, DegenerateMetric> {
    if returns.len() < 2 {
        return Err(DegenerateMetric {
            metric: "sharpe_ratio",
            reason: "fewer than two period returns",
        });
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    // sample standard deviation
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev == 0.0 || stddev <= mean.abs() * f64::EPSILON {
        return Err(DegenerateMetric {
            metric: "sharpe_ratio",
            reason: "zero return variance",
        });
    }

    Ok(mean / stddev * periods_per_year.sqrt())
}

fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in values {
        peak = peak.max(value);
        if peak > 0.0 {
            max_dd = max_dd.min((value - peak) / peak);
        }
    }

    max_dd
}

/// Zero when there are no returns at all.
fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// `win_rate * avg_gain - (1 - win_rate) * |avg_loss|`.
///
/// A side with no returns contributes an average of 0, so a gains-only series
/// yields its mean gain and a losses-only series its negative mean loss.
/// Undefined only when every return is zero.
fn expectancy(returns: &[f64], win_rate: f64) -> Result<f64, DegenerateMetric> {
    let gains: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();

    if gains.is_empty() && losses.is_empty() {
        return Err(DegenerateMetric {
            metric: "expectancy",
            reason: "no non-zero period returns",
        });
    }

    let avg_gain = mean(&gains).unwrap_or(0.0);
    let avg_loss = mean(&losses).unwrap_or(0.0);
    Ok(win_rate * avg_gain - (1.0 - win_rate) * avg_loss.abs())
}

fn exposure_time(positions: &PositionSeries) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    positions.exposed_bars() as f64 / positions.len() as f64 * 100.0
}
