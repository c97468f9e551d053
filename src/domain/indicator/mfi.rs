//! Money Flow Index indicator.
//!
//! Raw money flow = typical_price * V. A bar's flow is positive when its
//! typical price rose from the prior bar, negative when it fell.
//! MFI = 100 - 100 / (1 + sum(positive, n) / sum(negative, n)).
//! If the negative sum is 0: MFI = 100.
//!
//! Warmup: first (n-1) bars are `None`.

use crate::domain::indicator_helpers::rolling_sum;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn calculate_mfi(bars: &[OhlcvBar], period: usize) -> Column {
    let mut positive = Vec::with_capacity(bars.len());
    let mut negative = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let tp = bar.typical_price();
        let flow = tp * bar.volume;
        let prev_tp = if i == 0 { None } else { Some(bars[i - 1].typical_price()) };
        match prev_tp {
            Some(p) if tp > p => {
                positive.push(flow);
                negative.push(0.0);
            }
            Some(p) if tp < p => {
                positive.push(0.0);
                negative.push(flow);
            }
            _ => {
                positive.push(0.0);
                negative.push(0.0);
            }
        }
    }

    let pos = rolling_sum(&positive, period);
    let neg = rolling_sum(&negative, period);
    pos.into_iter()
        .zip(neg)
        .map(|(p, n)| match (p, n) {
            (Some(_), Some(n)) if n == 0.0 => Some(100.0),
            (Some(p), Some(n)) => Some(100.0 - 100.0 / (1.0 + p / n)),
            _ => None,
        })
        .collect()
}
