//! Configuration validation and loading.
//!
//! Reads `[strategy]` and `[backtest]` through a [`ConfigPort`] and produces a
//! checked [`BacktestConfig`]. Absent keys fall back to defaults, except
//! `periods_per_year`, which must be stated. Present but unparsable values are
//! errors rather than silent defaults.

use std::str::FromStr;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::BacktestError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let periods_per_year = match config.get_string("backtest", "periods_per_year") {
        Some(s) if !s.trim().is_empty() => parse_value::<f64>("backtest", "periods_per_year", &s)?,
        _ => {
            return Err(BacktestError::ConfigMissing {
                section: "backtest".to_string(),
                key: "periods_per_year".to_string(),
            });
        }
    };

    let defaults = BacktestConfig::new(periods_per_year);
    let loaded = BacktestConfig {
        short_window: read(config, "strategy", "short_window", defaults.short_window)?,
        long_window: read(config, "strategy", "long_window", defaults.long_window)?,
        vwap_window: read(config, "strategy", "vwap_window", defaults.vwap_window)?,
        vwap_cumulative: read_vwap_mode(config)?,
        threshold: read(config, "strategy", "threshold", defaults.threshold)?,
        atr_period: read(config, "strategy", "atr_period", defaults.atr_period)?,
        breakout_window: read(config, "strategy", "breakout_window", defaults.breakout_window)?,
        atr_multiplier: read(config, "strategy", "atr_multiplier", defaults.atr_multiplier)?,
        allow_shorting: read_bool(config, "strategy", "allow_shorting", defaults.allow_shorting)?,
        initial_capital: read(config, "backtest", "initial_capital", defaults.initial_capital)?,
        commission_rate: read(config, "backtest", "commission_rate", defaults.commission_rate)?,
        slippage_rate: read(config, "backtest", "slippage_rate", defaults.slippage_rate)?,
        execution_delay_bars: read(
            config,
            "backtest",
            "execution_delay_bars",
            defaults.execution_delay_bars,
        )?,
        periods_per_year,
    };

    validate_backtest_config(&loaded)?;
    Ok(loaded)
}

pub fn load_strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, BacktestError> {
    match config.get_string("strategy", "kind") {
        Some(s) if !s.trim().is_empty() => {
            s.parse::<StrategyKind>()
                .map_err(|reason| BacktestError::ConfigInvalid {
                    section: "strategy".to_string(),
                    key: "kind".to_string(),
                    reason,
                })
        }
        _ => Err(BacktestError::ConfigMissing {
            section: "strategy".to_string(),
            key: "kind".to_string(),
        }),
    }
}

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), BacktestError> {
    validate_windows(config)?;
    validate_strategy_params(config)?;
    validate_costs(config)?;
    validate_execution(config)?;
    Ok(())
}

fn validate_windows(config: &BacktestConfig) -> Result<(), BacktestError> {
    let windows = [
        ("short_window", config.short_window),
        ("long_window", config.long_window),
        ("vwap_window", config.vwap_window),
        ("atr_period", config.atr_period),
        ("breakout_window", config.breakout_window),
    ];
    for (key, value) in windows {
        if value == 0 {
            return Err(invalid("strategy", key, format!("{key} must be at least 1")));
        }
    }

    if config.short_window >= config.long_window {
        return Err(invalid(
            "strategy",
            "short_window",
            "short_window must be less than long_window".to_string(),
        ));
    }
    Ok(())
}

fn validate_strategy_params(config: &BacktestConfig) -> Result<(), BacktestError> {
    if !(config.threshold > 0.0 && config.threshold.is_finite()) {
        return Err(invalid(
            "strategy",
            "threshold",
            "threshold must be positive".to_string(),
        ));
    }
    if !(config.atr_multiplier > 0.0 && config.atr_multiplier.is_finite()) {
        return Err(invalid(
            "strategy",
            "atr_multiplier",
            "atr_multiplier must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_costs(config: &BacktestConfig) -> Result<(), BacktestError> {
    if !(config.initial_capital > 0.0 && config.initial_capital.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive".to_string(),
        ));
    }
    for (key, value) in [
        ("commission_rate", config.commission_rate),
        ("slippage_rate", config.slippage_rate),
    ] {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "backtest",
                key,
                format!("{key} must be in [0, 1)"),
            ));
        }
    }
    Ok(())
}

fn validate_execution(config: &BacktestConfig) -> Result<(), BacktestError> {
    if config.execution_delay_bars < 1 {
        return Err(invalid(
            "backtest",
            "execution_delay_bars",
            "execution_delay_bars must be at least 1".to_string(),
        ));
    }
    if !(config.periods_per_year > 0.0 && config.periods_per_year.is_finite()) {
        return Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be positive".to_string(),
        ));
    }
    Ok(())
}

fn read_vwap_mode(config: &dyn ConfigPort) -> Result<bool, BacktestError> {
    match config.get_string("strategy", "vwap_mode") {
        None => Ok(false),
        Some(s) => match s.trim().to_lowercase().as_str() {
            "" | "rolling" => Ok(false),
            "cumulative" => Ok(true),
            other => Err(invalid(
                "strategy",
                "vwap_mode",
                format!("unknown vwap_mode '{other}' (expected rolling or cumulative)"),
            )),
        },
    }
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, BacktestError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(invalid(
            section,
            key,
            format!("cannot parse '{other}' as a boolean"),
        )),
    }
}

fn read<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, BacktestError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => parse_value(section, key, &s),
        _ => Ok(default),
    }
}

fn parse_value<T: FromStr>(section: &str, key: &str, raw: &str) -> Result<T, BacktestError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| invalid(section, key, format!("cannot parse '{}'", raw.trim())))
}

fn invalid(section: &str, key: &str, reason: String) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
