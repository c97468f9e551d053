//! Rate of Change indicator.
//!
//! ROC[i] = 100 * (C[i] - C[i-n]) / C[i-n]
//! Warmup: first n bars are `None`. A zero reference close yields `None`.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn calculate_roc(bars: &[OhlcvBar], period: usize) -> Column {
    (0..bars.len())
        .map(|i| {
            if period == 0 || i < period {
                return None;
            }
            let prev = bars[i - period].close;
            if prev == 0.0 {
                None
            } else {
                Some(100.0 * (bars[i].close - prev) / prev)
            }
        })
        .collect()
}
