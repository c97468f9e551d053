//! Exponential Moving Average indicator.
//!
//! alpha = 2/(n+1), bias-adjusted weighting over every bar seen so far:
//! EMA[i] = sum((1-alpha)^k * C[i-k]) / sum((1-alpha)^k).
//! Defined from the first bar; no warmup.

use crate::domain::indicator_helpers::ewm_mean;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> Column {
    if period == 0 {
        return vec![None; bars.len()];
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    ewm_mean(&closes, period).into_iter().map(Some).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::bars_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn ema_starts_at_first_close() {
        let series = calculate_ema(&bars_from_closes(&[10.0, 20.0, 30.0]), 3);
        assert_relative_eq!(series[0].unwrap(), 10.0);
    }

    #[test]
    fn ema_tracks_rising_prices_with_lag() {
        let series = calculate_ema(&bars_from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3);
        let last = series[4].unwrap();
        assert!(last < 50.0);
        assert!(last > 40.0);
    }

    #[test]
    fn ema_period_1_equals_close() {
        let series = calculate_ema(&bars_from_closes(&[10.0, 20.0, 30.0]), 1);
        assert_relative_eq!(series[2].unwrap(), 30.0);
    }

    #[test]
    fn ema_zero_period_is_empty() {
        let series = calculate_ema(&bars_from_closes(&[10.0, 20.0]), 0);
        assert!(series.iter().all(Option::is_none));
    }
}
