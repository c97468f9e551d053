//! Average True Range indicator.
//!
//! TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|), with TR[0] = H-L.
//! ATR is the bias-adjusted exponentially weighted mean of TR with span n,
//! defined from the first bar.

use crate::domain::indicator_helpers::ewm_mean;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = if i == 0 { None } else { Some(bars[i - 1].close) };
            bar.true_range(prev_close)
        })
        .collect()
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Column {
    if period == 0 {
        return vec![None; bars.len()];
    }
    ewm_mean(&true_ranges(bars), period)
        .into_iter()
        .map(Some)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::bars_from_hlcv;
    use approx::assert_relative_eq;

    #[test]
    fn true_range_handles_gaps() {
        let bars = bars_from_hlcv(&[(11.0, 9.0, 10.0, 1.0), (16.0, 14.0, 15.0, 1.0)]);
        let tr = true_ranges(&bars);
        assert_relative_eq!(tr[0], 2.0);
        assert_relative_eq!(tr[1], 6.0);
    }

    #[test]
    fn atr_constant_range() {
        let rows = vec![(12.0, 10.0, 11.0, 1.0); 10];
        let atr = calculate_atr(&bars_from_hlcv(&rows), 3);
        assert_relative_eq!(atr[9].unwrap(), 2.0);
    }
}
