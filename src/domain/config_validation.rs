//! Configuration validation.
//!
//! Checks raw config values before any run. Missing keys fall back to the
//! same defaults the typed config structs use, so only explicit bad values
//! are rejected.

use chrono::NaiveDate;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::QuantError;
use crate::domain::optimizer::solver::SolverConfig;
use crate::domain::rebalancer::RebalanceConfig;
use crate::domain::risk::var::{HorizonScaling, VarConfig};
use crate::domain::strategy::{
    BreakoutConfig, DEFAULT_POSITION_SIZE_PCT, MeanReversionConfig, MomentumConfig, StrategyKind,
};
use crate::ports::config_port::ConfigPort;

/// Ceiling for `[strategy] position_size` when `max_position_size` is unset.
pub const DEFAULT_MAX_POSITION_SIZE: f64 = 0.25;

/// Run every section's checks.
pub fn validate_all(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_risk_config(config)?;
    validate_optimizer_config(config)?;
    validate_rebalance_config(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let defaults = BacktestConfig::default();

    let capital = config.get_double("backtest", "initial_capital", defaults.initial_capital);
    if capital <= 0.0 {
        return Err(QuantError::config_invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let commission = config.get_double("backtest", "commission", defaults.commission_rate);
    if !(0.0..1.0).contains(&commission) {
        return Err(QuantError::config_invalid(
            "backtest",
            "commission",
            "commission must be in [0, 1)",
        ));
    }

    let start = optional_date(config, "start_date")?;
    let end = optional_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(QuantError::config_invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

/// Parse `[backtest] <key>` as `YYYY-MM-DD` if present.
pub fn optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, QuantError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                QuantError::config_invalid(
                    "backtest",
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
    }
}

/// Strategy kind from `[strategy] kind`, defaulting to momentum.
pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, QuantError> {
    match config.get_string("strategy", "kind") {
        None => Ok(StrategyKind::Momentum),
        Some(s) => s
            .parse()
            .map_err(|reason: String| QuantError::config_invalid("strategy", "kind", reason)),
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let kind = strategy_kind(config)?;

    let max_size = config.get_double("strategy", "max_position_size", DEFAULT_MAX_POSITION_SIZE);
    if max_size <= 0.0 || max_size > 1.0 {
        return Err(QuantError::config_invalid(
            "strategy",
            "max_position_size",
            "max_position_size must be in (0, 1]",
        ));
    }

    let size = config.get_double("strategy", "position_size", DEFAULT_POSITION_SIZE_PCT);
    if size <= 0.0 || size > max_size {
        return Err(QuantError::config_invalid(
            "strategy",
            "position_size",
            format!("position_size must be in (0, {max_size}]"),
        ));
    }

    match kind {
        StrategyKind::Momentum => validate_momentum(config),
        StrategyKind::MeanReversion => validate_mean_reversion(config),
        StrategyKind::Breakout => validate_breakout(config),
    }
}

fn validate_momentum(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let d = MomentumConfig::default();
    positive_int(config, "strategy", "rsi_period", d.rsi_period)?;
    let fast = positive_int(config, "strategy", "fast_ma", d.fast_ma)?;
    let slow = positive_int(config, "strategy", "slow_ma", d.slow_ma)?;
    if fast >= slow {
        return Err(QuantError::config_invalid(
            "strategy",
            "fast_ma",
            "fast_ma must be less than slow_ma",
        ));
    }

    let oversold = config.get_double("strategy", "rsi_oversold", d.rsi_oversold);
    let overbought = config.get_double("strategy", "rsi_overbought", d.rsi_overbought);
    if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
        return Err(QuantError::config_invalid(
            "strategy",
            "rsi_oversold",
            "RSI thresholds must be within [0, 100]",
        ));
    }
    if oversold >= overbought {
        return Err(QuantError::config_invalid(
            "strategy",
            "rsi_oversold",
            "rsi_oversold must be less than rsi_overbought",
        ));
    }
    Ok(())
}

fn validate_mean_reversion(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let d = MeanReversionConfig::default();
    let period = positive_int(config, "strategy", "bb_period", d.bb_period)?;
    if period < 2 {
        return Err(QuantError::config_invalid(
            "strategy",
            "bb_period",
            "bb_period must be at least 2",
        ));
    }
    positive_double(config, "strategy", "bb_std", d.bb_std)?;
    Ok(())
}

fn validate_breakout(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let d = BreakoutConfig::default();
    positive_int(config, "strategy", "lookback", d.lookback)?;
    positive_double(config, "strategy", "volume_multiplier", d.volume_multiplier)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let d = VarConfig::default();

    let confidence = config.get_double("risk", "confidence", d.confidence);
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(QuantError::config_invalid(
            "risk",
            "confidence",
            "confidence must be in (0, 1)",
        ));
    }
    positive_double(config, "risk", "portfolio_value", d.portfolio_value)?;
    positive_int(config, "risk", "simulations", d.simulations)?;
    positive_int(config, "risk", "horizon_days", d.horizon_days as usize)?;

    if let Some(s) = config.get_string("risk", "horizon_scaling") {
        s.parse::<HorizonScaling>()
            .map_err(|reason| QuantError::config_invalid("risk", "horizon_scaling", reason))?;
    }

    let seed = config.get_int("risk", "seed", d.seed as i64);
    if seed < 0 {
        return Err(QuantError::config_invalid("risk", "seed", "seed must be non-negative"));
    }
    Ok(())
}

pub fn validate_optimizer_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let d = SolverConfig::default();
    positive_int(config, "optimizer", "max_iterations", d.max_iterations)?;
    positive_double(config, "optimizer", "tolerance", d.tolerance)?;
    positive_int(config, "optimizer", "frontier_points", 100)?;
    Ok(())
}

pub fn validate_rebalance_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let d = RebalanceConfig::default();
    for (key, default) in [
        ("min_trade_value", d.min_trade_value),
        ("threshold", d.threshold_pct),
        ("commission", d.commission),
    ] {
        if config.get_double("rebalance", key, default) < 0.0 {
            return Err(QuantError::config_invalid(
                "rebalance",
                key,
                format!("{key} must be non-negative"),
            ));
        }
    }
    Ok(())
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, QuantError> {
    let value = config.get_int(section, key, default as i64);
    if value <= 0 {
        return Err(QuantError::config_invalid(
            section,
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(value as usize)
}

fn positive_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, QuantError> {
    let value = config.get_double(section, key, default);
    if !(value.is_finite() && value > 0.0) {
        return Err(QuantError::config_invalid(
            section,
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(value)
}
