//! Performance and distribution ratios for daily return series.
//!
//! Annualization assumes 252 trading days. Population moments (n denominator)
//! are used throughout. Any ratio whose denominator is zero resolves to 0.

use super::super::returns::ReturnsMatrix;
use super::super::stats::{self, STD_EPSILON, TRADING_DAYS_PER_YEAR};

/// Standard deviation of returns, optionally annualized by `sqrt(252)`.
pub fn volatility(returns: &[f64], annualize: bool) -> f64 {
    let vol = stats::population_std(returns);
    if annualize {
        vol * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        vol
    }
}

/// Standard deviation of the returns strictly below `target`; 0 if none.
pub fn downside_deviation(returns: &[f64], target: f64, annualize: bool) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < target).collect();
    if downside.is_empty() {
        return 0.0;
    }
    volatility(&downside, annualize)
}

/// Annualized Sharpe ratio against an annual risk-free rate.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    let vol = volatility(returns, true);
    if vol < STD_EPSILON {
        return 0.0;
    }
    (annual_mean(returns) - risk_free_rate) / vol
}

/// Annualized Sortino ratio. Downside deviation uses returns below `target`.
pub fn sortino_ratio(returns: &[f64], target: f64, risk_free_rate: f64) -> f64 {
    let dd = downside_deviation(returns, target, true);
    if dd < STD_EPSILON {
        return 0.0;
    }
    (annual_mean(returns) - risk_free_rate) / dd
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawdownInfo {
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub peak_value: f64,
    pub trough_value: f64,
    pub peak_idx: usize,
    pub trough_idx: usize,
}

/// Largest peak-to-trough decline of a price or equity series.
///
/// The trough is the first bar with the most negative distance from the
/// running maximum; the peak is the first bar that set that maximum.
pub fn max_drawdown(prices: &[f64]) -> DrawdownInfo {
    if prices.is_empty() {
        return DrawdownInfo::default();
    }

    let mut running_max = Vec::with_capacity(prices.len());
    let mut peak = f64::NEG_INFINITY;
    for &p in prices {
        peak = peak.max(p);
        running_max.push(peak);
    }

    let mut trough_idx = 0;
    let mut worst = 0.0_f64;
    for (i, (&p, &m)) in prices.iter().zip(&running_max).enumerate() {
        if p - m < worst {
            worst = p - m;
            trough_idx = i;
        }
    }

    let peak_level = running_max[trough_idx];
    let peak_idx = running_max[..=trough_idx]
        .iter()
        .position(|m| *m == peak_level)
        .unwrap_or(0);

    let pct = if peak_level > 0.0 {
        (worst / peak_level * 100.0).abs()
    } else {
        0.0
    };

    DrawdownInfo {
        max_drawdown: worst.abs(),
        max_drawdown_pct: pct,
        peak_value: prices[peak_idx],
        trough_value: prices[trough_idx],
        peak_idx,
        trough_idx,
    }
}

/// Annualized mean return divided by max drawdown percent.
pub fn calmar_ratio(returns: &[f64], prices: &[f64]) -> f64 {
    let dd = max_drawdown(prices).max_drawdown_pct;
    if dd == 0.0 {
        return 0.0;
    }
    annual_mean(returns) / dd
}

pub fn skewness(returns: &[f64]) -> f64 {
    stats::skewness(returns)
}

/// Excess kurtosis (normal distribution = 0).
pub fn kurtosis(returns: &[f64]) -> f64 {
    stats::excess_kurtosis(returns)
}

/// Population covariance over population market variance.
pub fn beta(asset_returns: &[f64], market_returns: &[f64]) -> f64 {
    let var = stats::population_std(market_returns).powi(2);
    if var < STD_EPSILON {
        return 0.0;
    }
    stats::population_cov(asset_returns, market_returns) / var
}

/// Jensen's alpha, annualized.
pub fn alpha(asset_returns: &[f64], market_returns: &[f64], risk_free_rate: f64) -> f64 {
    let b = beta(asset_returns, market_returns);
    let asset = annual_mean(asset_returns);
    let market = annual_mean(market_returns);
    asset - (risk_free_rate + b * (market - risk_free_rate))
}

/// Annualized mean excess return over annualized tracking error.
pub fn information_ratio(asset_returns: &[f64], benchmark_returns: &[f64]) -> f64 {
    let excess: Vec<f64> = asset_returns
        .iter()
        .zip(benchmark_returns)
        .map(|(a, b)| a - b)
        .collect();
    let tracking_error = volatility(&excess, true);
    if tracking_error < STD_EPSILON {
        return 0.0;
    }
    annual_mean(&excess) / tracking_error
}

/// `|p(100 - q)| / |p(q)|`; 0 when the lower tail is not a loss.
pub fn tail_ratio(returns: &[f64], percentile: f64) -> f64 {
    let upper = stats::percentile(returns, 100.0 - percentile);
    let lower = stats::percentile(returns, percentile);
    if lower >= 0.0 {
        return 0.0;
    }
    (upper / lower).abs()
}

pub fn correlation_matrix(returns: &ReturnsMatrix) -> Vec<Vec<f64>> {
    returns.correlation_matrix()
}

/// Full set of risk statistics for one return series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiskReport {
    pub mean_return: f64,
    pub median_return: f64,
    pub volatility: f64,
    pub downside_deviation: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub drawdown: DrawdownInfo,
    pub skewness: f64,
    pub kurtosis: f64,
    pub tail_ratio: f64,
}

/// Every ratio in this module, computed once. `prices` feeds the drawdown.
pub fn comprehensive_report(returns: &[f64], prices: &[f64], risk_free_rate: f64) -> RiskReport {
    RiskReport {
        mean_return: annual_mean(returns),
        median_return: stats::median(returns) * TRADING_DAYS_PER_YEAR,
        volatility: volatility(returns, true),
        downside_deviation: downside_deviation(returns, 0.0, true),
        sharpe_ratio: sharpe_ratio(returns, risk_free_rate),
        sortino_ratio: sortino_ratio(returns, 0.0, risk_free_rate),
        calmar_ratio: calmar_ratio(returns, prices),
        drawdown: max_drawdown(prices),
        skewness: skewness(returns),
        kurtosis: kurtosis(returns),
        tail_ratio: tail_ratio(returns, 5.0),
    }
}

fn annual_mean(returns: &[f64]) -> f64 {
    stats::mean(returns) * TRADING_DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_returns() -> Vec<f64> {
        vec![0.01, -0.02, 0.015, 0.005, -0.01, 0.02, -0.005, 0.01]
    }

    #[test]
    fn volatility_annualizes() {
        let r = sample_returns();
        assert_relative_eq!(
            volatility(&r, true),
            volatility(&r, false) * 252.0_f64.sqrt()
        );
    }

    #[test]
    fn downside_without_losses_is_zero() {
        assert_eq!(downside_deviation(&[0.01, 0.02], 0.0, true), 0.0);
        assert_eq!(sortino_ratio(&[0.01, 0.02], 0.0, 0.0), 0.0);
    }

    #[test]
    fn constant_returns_have_zero_sharpe() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 0.0), 0.0);
    }

    #[test]
    fn sharpe_subtracts_risk_free() {
        let r = sample_returns();
        let diff = sharpe_ratio(&r, 0.0) - sharpe_ratio(&r, 0.02);
        assert_relative_eq!(diff, 0.02 / volatility(&r, true), epsilon = 1e-12);
    }

    #[test]
    fn drawdown_locates_peak_and_trough() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 110.0, 80.0, 130.0]);
        assert_relative_eq!(dd.max_drawdown, 40.0);
        assert_relative_eq!(dd.max_drawdown_pct, 100.0 / 3.0, epsilon = 1e-12);
        assert_eq!(dd.peak_idx, 1);
        assert_eq!(dd.trough_idx, 4);
        assert_relative_eq!(dd.peak_value, 120.0);
        assert_relative_eq!(dd.trough_value, 80.0);
    }

    #[test]
    fn rising_series_has_no_drawdown() {
        let dd = max_drawdown(&[1.0, 2.0, 3.0]);
        assert_eq!(dd.max_drawdown, 0.0);
        assert_eq!(calmar_ratio(&[1.0, 0.5], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn beta_of_market_is_one() {
        let m = sample_returns();
        assert_relative_eq!(beta(&m, &m), 1.0, epsilon = 1e-12);
        let doubled: Vec<f64> = m.iter().map(|r| r * 2.0).collect();
        assert_relative_eq!(beta(&doubled, &m), 2.0, epsilon = 1e-12);
        assert_relative_eq!(alpha(&m, &m, 0.02), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn flat_market_beta_is_zero() {
        assert_eq!(beta(&[0.01, 0.02], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn information_ratio_zero_tracking_error() {
        let r = sample_returns();
        assert_eq!(information_ratio(&r, &r), 0.0);
    }

    #[test]
    fn tail_ratio_without_loss_tail() {
        assert_eq!(tail_ratio(&[0.01, 0.02, 0.03], 5.0), 0.0);
        let r = [-0.02, -0.01, 0.0, 0.01, 0.04];
        let expected = (stats::percentile(&r, 95.0) / stats::percentile(&r, 5.0)).abs();
        assert_relative_eq!(tail_ratio(&r, 5.0), expected);
    }

    #[test]
    fn report_bundles_ratios() {
        let r = sample_returns();
        let prices = [100.0, 101.0, 98.98, 100.46];
        let report = comprehensive_report(&r, &prices, 0.0);
        assert_relative_eq!(report.sharpe_ratio, sharpe_ratio(&r, 0.0));
        assert_relative_eq!(report.mean_return, stats::mean(&r) * 252.0);
        assert_eq!(report.drawdown, max_drawdown(&prices));
    }
}
