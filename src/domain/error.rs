//! Domain error types.

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("malformed series for {instrument} at bar {index}: {reason}")]
    MalformedSeries {
        instrument: String,
        index: usize,
        reason: String,
    },

    #[error("insufficient data for {instrument}: have {bars} bars, need {minimum}")]
    InsufficientData {
        instrument: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A metric whose denominator vanished.
///
/// Never escapes the metrics engine: it is logged and the metric becomes NaN.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{metric} is undefined: {reason}")]
pub struct DegenerateMetric {
    pub metric: &'static str,
    pub reason: &'static str,
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Data { .. } => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::MalformedSeries { .. } | BacktestError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = BacktestError::InsufficientData {
            instrument: "BTCUSDT".into(),
            bars: 12,
            minimum: 50,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for BTCUSDT: have 12 bars, need 50"
        );
    }

    #[test]
    fn malformed_series_message() {
        let err = BacktestError::MalformedSeries {
            instrument: "ETHUSDT".into(),
            index: 3,
            reason: "duplicate timestamp".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed series for ETHUSDT at bar 3: duplicate timestamp"
        );
    }

    #[test]
    fn degenerate_metric_message() {
        let err = DegenerateMetric {
            metric: "sharpe_ratio",
            reason: "zero return variance",
        };
        assert_eq!(err.to_string(), "sharpe_ratio is undefined: zero return variance");
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;

        let config = BacktestError::ConfigMissing {
            section: "backtest".into(),
            key: "periods_per_year".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));

        let data = BacktestError::InsufficientData {
            instrument: "X".into(),
            bars: 1,
            minimum: 2,
        };
        assert_eq!(ExitCode::from(&data), ExitCode::from(5));
    }
}
