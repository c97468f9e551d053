//! Simple Moving Average indicator.
//!
//! SMA[i] = mean(close[i-n+1..=i]).
//! Warmup: first (n-1) bars are `None`.

use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> Column {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    rolling_mean(&closes, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::bars_from_closes;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&bars_from_closes(&[10.0, 20.0, 30.0, 40.0]), 3);
        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert_eq!(series[2], Some(20.0));
        assert_eq!(series[3], Some(30.0));
    }

    #[test]
    fn sma_period_longer_than_data() {
        let series = calculate_sma(&bars_from_closes(&[10.0, 20.0]), 5);
        assert!(series.iter().all(Option::is_none));
    }
}
