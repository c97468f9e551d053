//! Shared window functions for indicator calculations.
//!
//! All helpers return one value per input row. Rolling windows require a
//! full window (`None` until `window` rows are available); exponentially
//! weighted means are defined from the first row.

/// Rolling arithmetic mean over `window` rows.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_sum(values, window)
        .into_iter()
        .map(|s| s.map(|s| s / window as f64))
        .collect()
}

/// Rolling sum over `window` rows.
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out.push(Some(sum));
        } else {
            out.push(None);
        }
    }
    out
}

/// Rolling mean over a nullable series. A window containing any `None` is `None`.
pub fn rolling_mean_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum: Option<f64> = slice.iter().copied().sum();
            sum.map(|s| s / window as f64)
        })
        .collect()
}

/// Rolling sample standard deviation (n - 1 denominator).
pub fn rolling_sample_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
            Some(var.sqrt())
        })
        .collect()
}

/// Rolling maximum over `window` rows.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_fold(values, window, f64::max)
}

/// Rolling minimum over `window` rows.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_fold(values, window, f64::min)
}

fn rolling_fold(values: &[f64], window: usize, f: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                values[i + 1 - window..=i].iter().copied().reduce(f)
            }
        })
        .collect()
}

/// Shift a series forward by one row so each row sees only prior rows.
pub fn shift_one(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if !values.is_empty() {
        out.push(None);
        out.extend_from_slice(&values[..values.len() - 1]);
    }
    out
}

/// Bias-adjusted exponentially weighted mean with alpha = 2 / (span + 1).
///
/// EWM[t] = sum((1-a)^i * x[t-i]) / sum((1-a)^i), over all rows so far.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut num = 0.0;
    let mut den = 0.0;
    values
        .iter()
        .map(|v| {
            num = v + decay * num;
            den = 1.0 + decay * den;
            num / den
        })
        .collect()
}
