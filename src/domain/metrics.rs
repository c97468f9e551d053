//! Backtest performance metrics.
//!
//! Reduces an equity history and a trade ledger into a fixed report. With no
//! trades every field is zero. Ratios with a zero denominator resolve to 0.

use chrono::NaiveDate;

use super::backtest::EquityPoint;
use super::position::Trade;
use super::stats::{self, TRADING_DAYS_PER_YEAR};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PerformanceMetrics {
    pub num_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent of trades with positive pnl (0..=100).
    pub win_rate: f64,
    pub avg_win: f64,
    /// Mean pnl of losing trades (a negative number).
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Largest peak-to-trough equity decline, as a positive amount.
    pub max_drawdown: f64,
    /// `max_drawdown` relative to the running peak at the trough, in percent.
    pub max_drawdown_pct: f64,
}

impl PerformanceMetrics {
    pub fn calculate(equity_curve: &[EquityPoint], trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();

        let num_trades = trades.len();
        let win_rate = wins.len() as f64 / num_trades as f64 * 100.0;

        let largest_win = pnls.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let largest_loss = pnls.iter().copied().fold(f64::INFINITY, f64::min);

        let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let returns = stats::pct_returns(&equity);
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&returns);
        let (max_drawdown, max_drawdown_pct) = compute_drawdown(&equity);

        PerformanceMetrics {
            num_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            avg_win: stats::mean(&wins),
            avg_loss: stats::mean(&losses),
            largest_win,
            largest_loss,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_pct,
        }
    }
}

/// Annualized Sharpe and Sortino from per-bar returns (risk-free rate 0).
fn compute_risk_adjusted(returns: &[f64]) -> (f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0);
    }
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();
    let mean = stats::mean(returns);

    let sharpe = annualizer * stats::safe_div(mean, stats::population_std(returns));

    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let sortino = if downside.is_empty() {
        0.0
    } else {
        annualizer * stats::safe_div(mean, stats::population_std(&downside))
    };

    (sharpe, sortino)
}

/// (max drawdown amount, max drawdown percent of the peak at the trough).
fn compute_drawdown(equity: &[f64]) -> (f64, f64) {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    let mut peak_at_worst = 0.0_f64;

    for &value in equity {
        peak = peak.max(value);
        let dd = value - peak;
        if dd < worst {
            worst = dd;
            peak_at_worst = peak;
        }
    }

    let pct = if peak_at_worst > 0.0 {
        (worst / peak_at_worst * 100.0).abs()
    } else {
        0.0
    };
    (worst.abs(), pct)
}

/// Rolling statistics of the per-bar equity returns.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingPoint {
    pub timestamp: NaiveDate,
    pub equity: f64,
    pub rolling_return: Option<f64>,
    pub rolling_volatility: Option<f64>,
    pub rolling_sharpe: Option<f64>,
}

/// Rolling mean return, sample volatility, and annualized Sharpe over
/// `window` returns. The first bar has no return, so values start at
/// index `window`.
pub fn rolling_metrics(equity_curve: &[EquityPoint], window: usize) -> Vec<RollingPoint> {
    let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
    let returns = stats::pct_returns(&equity);

    equity_curve
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let (ret, vol) = if window > 0 && i >= window {
                let slice = &returns[i - window..i];
                (Some(stats::mean(slice)), Some(stats::sample_std(slice)))
            } else {
                (None, None)
            };
            let sharpe = match (ret, vol) {
                (Some(r), Some(v)) if v > stats::STD_EPSILON => {
                    Some(r / v * TRADING_DAYS_PER_YEAR.sqrt())
                }
                _ => None,
            };
            RollingPoint {
                timestamp: point.timestamp,
                equity: point.equity,
                rolling_return: ret,
                rolling_volatility: vol,
                rolling_sharpe: sharpe,
            }
        })
        .collect()
}
