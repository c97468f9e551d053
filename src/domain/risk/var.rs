//! Value at Risk and Conditional Value at Risk.
//!
//! Every estimator returns a non-negative dollar loss: `max(-r, 0) * value`
//! for the threshold return `r`. A threshold that is a gain reports no loss.
//!
//! | Method      | Threshold return                                  |
//! |-------------|---------------------------------------------------|
//! | historical  | empirical `(1 - c)` percentile                    |
//! | parametric  | `mean + z(1 - c) * std`                           |
//! | Monte Carlo | `(1 - c)` percentile of Normal(mean, std) draws   |
//!
//! Standard deviations are population (n denominator).

use std::fmt;
use std::str::FromStr;

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use tracing::debug;

use super::super::returns::ReturnsMatrix;
use super::super::stats::{self, STD_EPSILON};

/// Weight bump used by [`marginal_var`].
pub const MARGINAL_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizonScaling {
    /// `var * sqrt(days)`; assumes i.i.d. returns.
    #[default]
    Sqrt,
    Linear,
}

impl FromStr for HorizonScaling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqrt" => Ok(HorizonScaling::Sqrt),
            "linear" => Ok(HorizonScaling::Linear),
            other => Err(format!("unknown horizon scaling '{other}', expected sqrt or linear")),
        }
    }
}

impl fmt::Display for HorizonScaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HorizonScaling::Sqrt => write!(f, "sqrt"),
            HorizonScaling::Linear => write!(f, "linear"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarConfig {
    pub confidence: f64,
    pub portfolio_value: f64,
    pub simulations: usize,
    /// Seed for the Monte Carlo draws.
    pub seed: u64,
    pub horizon_days: u32,
    pub horizon_scaling: HorizonScaling,
}

impl Default for VarConfig {
    fn default() -> Self {
        VarConfig {
            confidence: 0.95,
            portfolio_value: 1_000_000.0,
            simulations: 10_000,
            seed: 42,
            horizon_days: 1,
            horizon_scaling: HorizonScaling::Sqrt,
        }
    }
}

/// VaR and CVaR from every method at one confidence level.
#[derive(Debug, Clone, PartialEq)]
pub struct VarReport {
    pub historical_var: f64,
    pub parametric_var: f64,
    pub monte_carlo_var: f64,
    pub historical_cvar: f64,
    pub parametric_cvar: f64,
    pub confidence_level: f64,
    pub portfolio_value: f64,
}

impl VarReport {
    /// Same report with every estimate scaled to a `days` horizon.
    pub fn scaled(&self, days: u32, scaling: HorizonScaling) -> VarReport {
        let s = |v| var_time_horizon(v, days, scaling);
        VarReport {
            historical_var: s(self.historical_var),
            parametric_var: s(self.parametric_var),
            monte_carlo_var: s(self.monte_carlo_var),
            historical_cvar: s(self.historical_cvar),
            parametric_cvar: s(self.parametric_cvar),
            ..self.clone()
        }
    }
}

pub fn historical_var(returns: &[f64], confidence: f64, portfolio_value: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    loss(stats::percentile(returns, tail_percent(confidence)), portfolio_value)
}

pub fn parametric_var(returns: &[f64], confidence: f64, portfolio_value: f64) -> f64 {
    let Some(z) = tail_z(confidence) else {
        return 0.0;
    };
    if returns.is_empty() {
        return 0.0;
    }
    let threshold = stats::mean(returns) + z * stats::population_std(returns);
    loss(threshold, portfolio_value)
}

/// Monte Carlo VaR drawing `n_simulations` returns from the fitted normal.
///
/// Deterministic for a seeded `rng`. A zero-variance series simulates its
/// mean exactly.
pub fn monte_carlo_var<R: Rng + ?Sized>(
    returns: &[f64],
    confidence: f64,
    portfolio_value: f64,
    n_simulations: usize,
    rng: &mut R,
) -> f64 {
    if returns.is_empty() || n_simulations == 0 {
        return 0.0;
    }
    let mean = stats::mean(returns);
    let std = stats::population_std(returns);

    let simulated: Vec<f64> = match Normal::new(mean, std) {
        Ok(normal) if std > STD_EPSILON => {
            (0..n_simulations).map(|_| normal.sample(&mut *rng)).collect()
        }
        _ => vec![mean; n_simulations],
    };
    loss(stats::percentile(&simulated, tail_percent(confidence)), portfolio_value)
}

/// Mean of the returns at or below the historical VaR threshold.
pub fn historical_cvar(returns: &[f64], confidence: f64, portfolio_value: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let threshold = stats::percentile(returns, tail_percent(confidence));
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= threshold).collect();
    if tail.is_empty() {
        return 0.0;
    }
    loss(stats::mean(&tail), portfolio_value)
}

/// Normal expected shortfall: `mean - std * pdf(z) / (1 - c)`.
pub fn parametric_cvar(returns: &[f64], confidence: f64, portfolio_value: f64) -> f64 {
    let Some(z) = tail_z(confidence) else {
        return 0.0;
    };
    if returns.is_empty() {
        return 0.0;
    }
    let pdf = standard_normal().map(|n| n.pdf(z)).unwrap_or(0.0);
    let threshold = stats::mean(returns) - stats::population_std(returns) * pdf / (1.0 - confidence);
    loss(threshold, portfolio_value)
}

/// All estimators at `config.confidence`, Monte Carlo seeded from
/// `config.seed`. Values are one-period; see [`VarReport::scaled`].
pub fn calculate_all_var(returns: &[f64], config: &VarConfig) -> VarReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let report = VarReport {
        historical_var: historical_var(returns, config.confidence, config.portfolio_value),
        parametric_var: parametric_var(returns, config.confidence, config.portfolio_value),
        monte_carlo_var: monte_carlo_var(
            returns,
            config.confidence,
            config.portfolio_value,
            config.simulations,
            &mut rng,
        ),
        historical_cvar: historical_cvar(returns, config.confidence, config.portfolio_value),
        parametric_cvar: parametric_cvar(returns, config.confidence, config.portfolio_value),
        confidence_level: config.confidence,
        portfolio_value: config.portfolio_value,
    };
    debug!(
        observations = returns.len(),
        confidence = config.confidence,
        historical = report.historical_var,
        "computed VaR"
    );
    report
}

pub fn var_time_horizon(var_1day: f64, days: u32, scaling: HorizonScaling) -> f64 {
    match scaling {
        HorizonScaling::Sqrt => var_1day * f64::from(days).sqrt(),
        HorizonScaling::Linear => var_1day * f64::from(days),
    }
}

/// Sensitivity of the portfolio's historical VaR threshold to each weight.
///
/// Each weight in turn is bumped by [`MARGINAL_EPSILON`], the vector is
/// renormalized to sum to 1, and the change in loss quantile is divided by
/// the bump. Results are in return units.
///
/// The sign is flipped relative to the raw change in the return quantile
/// (`-(q_bumped - q) / ε`): a positive value means the bump makes the tail
/// worse, matching the positive-loss convention of the VaR functions.
pub fn marginal_var(returns: &ReturnsMatrix, weights: &[f64], confidence: f64) -> Vec<f64> {
    let pct = tail_percent(confidence);
    let base = stats::percentile(&returns.portfolio_returns(weights), pct);

    (0..weights.len())
        .map(|i| {
            let mut bumped = weights.to_vec();
            bumped[i] += MARGINAL_EPSILON;
            let total: f64 = bumped.iter().sum();
            if total.abs() > STD_EPSILON {
                bumped.iter_mut().for_each(|w| *w /= total);
            }
            let q = stats::percentile(&returns.portfolio_returns(&bumped), pct);
            -(q - base) / MARGINAL_EPSILON
        })
        .collect()
}

fn loss(threshold_return: f64, portfolio_value: f64) -> f64 {
    (-threshold_return).max(0.0) * portfolio_value
}

fn tail_percent(confidence: f64) -> f64 {
    (1.0 - confidence) * 100.0
}

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

/// z-score of the `1 - confidence` tail, None outside (0, 1).
fn tail_z(confidence: f64) -> Option<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return None;
    }
    standard_normal().map(|n| n.inverse_cdf(1.0 - confidence))
}
