//! On-Balance Volume indicator.
//!
//! OBV[0] = 0; OBV[i] = OBV[i-1] + V[i] if C[i] > C[i-1],
//! OBV[i-1] - V[i] if C[i] < C[i-1], else OBV[i-1].
//! No warmup.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn calculate_obv(bars: &[OhlcvBar]) -> Column {
    let mut obv = 0.0;
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i > 0 {
                let prev = bars[i - 1].close;
                if bar.close > prev {
                    obv += bar.volume;
                } else if bar.close < prev {
                    obv -= bar.volume;
                }
            }
            Some(obv)
        })
        .collect()
}
