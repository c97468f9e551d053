//! Descriptive statistics shared by the metrics, risk, and optimizer modules.
//!
//! All functions are pure and total: empty input yields 0.0 rather than NaN.

use std::cmp::Ordering;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Standard deviations below this are treated as zero.
pub const STD_EPSILON: f64 = 1e-15;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (n denominator).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Sample standard deviation (n - 1 denominator), 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Population covariance of two equally long series.
pub fn population_cov(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));
    a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum::<f64>() / n as f64
}

/// Sample covariance (n - 1 denominator), 0 for fewer than two rows.
pub fn sample_cov(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    population_cov(a, b) * n as f64 / (n - 1) as f64
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is in percent (0..=100). rank = q/100 * (n-1).
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Simple returns `(p[t] - p[t-1]) / p[t-1]`. A zero prior price yields 0.
pub fn pct_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Population skewness (third standardized moment).
pub fn skewness(values: &[f64]) -> f64 {
    let std = population_std(values);
    if std < STD_EPSILON {
        return 0.0;
    }
    let m = mean(values);
    let n = values.len() as f64;
    values.iter().map(|v| ((v - m) / std).powi(3)).sum::<f64>() / n
}

/// Population excess kurtosis (fourth standardized moment minus 3).
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let std = population_std(values);
    if std < STD_EPSILON {
        return 0.0;
    }
    let m = mean(values);
    let n = values.len() as f64;
    values.iter().map(|v| ((v - m) / std).powi(4)).sum::<f64>() / n - 3.0
}

/// Divide, resolving a zero or non-finite result to 0.
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den.abs() < STD_EPSILON {
        return 0.0;
    }
    let out = num / den;
    if out.is_finite() { out } else { 0.0 }
}
