//! Mean-variance portfolio optimization.
//!
//! Annualized mean returns (`x 252`) and sample covariance (`x 252`) are
//! computed once from a [`ReturnsMatrix`]. Every optimization is long-only and
//! fully invested. Non-convergence is an [`OptimizationOutcome::Failed`] value,
//! never an error.

pub mod solver;

use tracing::debug;

use self::solver::{LinearEquality, SolverConfig, dot, minimize};
use super::error::QuantError;
use super::returns::ReturnsMatrix;
use super::stats::{STD_EPSILON, TRADING_DAYS_PER_YEAR};

/// Weights and statistics of one portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Fractional weights in ticker order, summing to 1.
    pub weights: Vec<(String, f64)>,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

impl Allocation {
    pub fn weight(&self, ticker: &str) -> Option<f64> {
        self.weights.iter().find(|(t, _)| t == ticker).map(|(_, w)| *w)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationOutcome {
    Solved(Allocation),
    Failed { message: String },
}

impl OptimizationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OptimizationOutcome::Solved(_))
    }

    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            OptimizationOutcome::Solved(a) => Some(a),
            OptimizationOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierPoint {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct PortfolioOptimizer {
    tickers: Vec<String>,
    mean_returns: Vec<f64>,
    covariance: Vec<Vec<f64>>,
    config: SolverConfig,
}

impl PortfolioOptimizer {
    /// Needs at least two return rows to estimate covariance.
    pub fn new(returns: &ReturnsMatrix, config: SolverConfig) -> Result<Self, QuantError> {
        if returns.n_rows() < 2 {
            return Err(QuantError::InvalidReturns {
                reason: format!("need at least 2 return rows, got {}", returns.n_rows()),
            });
        }
        let mean_returns = returns
            .mean_returns()
            .into_iter()
            .map(|m| m * TRADING_DAYS_PER_YEAR)
            .collect();
        let covariance = returns
            .covariance()
            .into_iter()
            .map(|row| row.into_iter().map(|c| c * TRADING_DAYS_PER_YEAR).collect())
            .collect();
        Ok(Self {
            tickers: returns.tickers().to_vec(),
            mean_returns,
            covariance,
            config,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn n_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Annualized mean return per asset.
    pub fn mean_returns(&self) -> &[f64] {
        &self.mean_returns
    }

    /// Annualized covariance matrix.
    pub fn covariance(&self) -> &[Vec<f64>] {
        &self.covariance
    }

    /// (expected return, volatility, Sharpe with zero risk-free rate).
    pub fn portfolio_stats(&self, weights: &[f64]) -> (f64, f64, f64) {
        let ret = dot(&self.mean_returns, weights);
        let vol = self.volatility(weights);
        let sharpe = if vol > STD_EPSILON { ret / vol } else { 0.0 };
        (ret, vol, sharpe)
    }

    /// Minimum-volatility portfolio, optionally pinned to `target_return`.
    pub fn minimize_volatility(&self, target_return: Option<f64>) -> OptimizationOutcome {
        let equality = target_return.map(|target| LinearEquality {
            coefficients: self.mean_returns.clone(),
            target,
        });
        self.solve("minimize_volatility", |w| self.volatility(w), equality.as_ref())
    }

    /// Tangency portfolio (risk-free rate 0).
    pub fn maximize_sharpe(&self) -> OptimizationOutcome {
        self.solve(
            "maximize_sharpe",
            |w| -self.portfolio_stats(w).2,
            None,
        )
    }

    /// Weights whose share of total variance is equal across assets.
    ///
    /// Each asset's share is `w_i (Σw)_i / wᵀΣw`; the objective is the sum of
    /// squared deviations of the shares from `1/n`.
    pub fn risk_parity(&self) -> OptimizationOutcome {
        let n = self.n_assets() as f64;
        self.solve(
            "risk_parity",
            |w| {
                let sigma_w = self.cov_times(w);
                let variance = dot(w, &sigma_w);
                if variance < STD_EPSILON {
                    return 0.0;
                }
                w.iter()
                    .zip(&sigma_w)
                    .map(|(wi, si)| (wi * si / variance - 1.0 / n).powi(2))
                    .sum()
            },
            None,
        )
    }

    /// Minimum-volatility portfolios at `n_points` evenly spaced target
    /// returns between the lowest and highest single-asset mean. Targets the
    /// solver cannot meet are left out.
    pub fn efficient_frontier(&self, n_points: usize) -> Vec<FrontierPoint> {
        let lo = self.mean_returns.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.mean_returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let points: Vec<FrontierPoint> = linspace(lo, hi, n_points)
            .into_iter()
            .filter_map(|target| match self.minimize_volatility(Some(target)) {
                OptimizationOutcome::Solved(a) => Some(FrontierPoint {
                    expected_return: a.expected_return,
                    volatility: a.volatility,
                    sharpe_ratio: a.sharpe_ratio,
                }),
                OptimizationOutcome::Failed { message } => {
                    debug!(target, %message, "dropping frontier point");
                    None
                }
            })
            .collect();
        debug!(requested = n_points, solved = points.len(), "efficient frontier");
        points
    }

    /// `1/n` in every asset; no optimization.
    pub fn equal_weight(&self) -> Allocation {
        let n = self.n_assets();
        self.allocation(vec![1.0 / n as f64; n])
    }

    fn solve<F>(&self, label: &str, objective: F, equality: Option<&LinearEquality>) -> OptimizationOutcome
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = self.n_assets();
        let start = vec![1.0 / n as f64; n];
        match minimize(objective, &start, equality, &self.config) {
            Ok(solution) => {
                debug!(label, iterations = solution.iterations, "optimizer converged");
                OptimizationOutcome::Solved(self.allocation(solution.weights))
            }
            Err(message) => {
                debug!(label, %message, "optimizer failed");
                OptimizationOutcome::Failed { message }
            }
        }
    }

    fn allocation(&self, weights: Vec<f64>) -> Allocation {
        let (expected_return, volatility, sharpe_ratio) = self.portfolio_stats(&weights);
        Allocation {
            weights: self.tickers.iter().cloned().zip(weights).collect(),
            expected_return,
            volatility,
            sharpe_ratio,
        }
    }

    fn cov_times(&self, w: &[f64]) -> Vec<f64> {
        self.covariance.iter().map(|row| dot(row, w)).collect()
    }

    fn volatility(&self, w: &[f64]) -> f64 {
        dot(w, &self.cov_times(w)).max(0.0).sqrt()
    }
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}
