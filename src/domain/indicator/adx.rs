//! Average Directional Index indicator.
//!
//! +DM = max(H - H[i-1], 0) when the up move exceeds the down move, else 0;
//! -DM likewise for L[i-1] - L. Both are 0 on the first bar.
//! TR, +DM and -DM are smoothed with an n-bar rolling mean, then
//! +DI = 100 * +DM_s / TR_s, -DI = 100 * -DM_s / TR_s,
//! DX = 100 * |+DI - -DI| / (+DI + -DI), ADX = n-bar rolling mean of DX.
//!
//! Warmup: first 2(n-1) bars are `None`; rows where DX is undefined
//! (zero range or no directional movement) are `None`.

use crate::domain::indicator::atr::true_ranges;
use crate::domain::indicator_helpers::{rolling_mean, rolling_mean_opt};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> Column {
    let mut plus_dm = Vec::with_capacity(bars.len());
    let mut minus_dm = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            plus_dm.push(0.0);
            minus_dm.push(0.0);
            continue;
        }
        let up = bar.high - bars[i - 1].high;
        let down = bars[i - 1].low - bar.low;
        plus_dm.push(if up > down { up.max(0.0) } else { 0.0 });
        minus_dm.push(if down > up { down.max(0.0) } else { 0.0 });
    }

    let atr = rolling_mean(&true_ranges(bars), period);
    let plus_s = rolling_mean(&plus_dm, period);
    let minus_s = rolling_mean(&minus_dm, period);

    let dx: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            let (tr, p, m) = (atr[i]?, plus_s[i]?, minus_s[i]?);
            if tr == 0.0 {
                return None;
            }
            let plus_di = 100.0 * p / tr;
            let minus_di = 100.0 * m / tr;
            let sum = plus_di + minus_di;
            if sum == 0.0 {
                None
            } else {
                Some(100.0 * (plus_di - minus_di).abs() / sum)
            }
        })
        .collect();

    rolling_mean_opt(&dx, period)
}
