//! RSI (Relative Strength Index) indicator.
//!
//! Gains and losses are the positive and negative close-to-close changes
//! (the first bar contributes 0 to both). Averages are simple rolling means
//! over n bars.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first (n-1) bars are `None`.

use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> Column {
    let mut gains = Vec::with_capacity(bars.len());
    let mut losses = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let change = if i == 0 { 0.0 } else { bar.close - bars[i - 1].close };
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(g, l)| match (g, l) {
            (Some(_), Some(l)) if l == 0.0 => Some(100.0),
            (Some(g), Some(l)) => Some(100.0 - 100.0 / (1.0 + g / l)),
            _ => None,
        })
        .collect()
}
