//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are `None`.

use crate::domain::indicator_helpers::{rolling_mean, rolling_sample_std};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerColumns {
    pub upper: Column,
    pub middle: Column,
    pub lower: Column,
}

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> BollingerColumns {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let mult = stddev_mult_x100 as f64 / 100.0;
    let middle = rolling_mean(&closes, period);
    let std = rolling_sample_std(&closes, period);

    let mut upper = Vec::with_capacity(bars.len());
    let mut lower = Vec::with_capacity(bars.len());
    for (m, s) in middle.iter().zip(&std) {
        match (m, s) {
            (Some(m), Some(s)) => {
                upper.push(Some(m + mult * s));
                lower.push(Some(m - mult * s));
            }
            _ => {
                upper.push(None);
                lower.push(None);
            }
        }
    }

    let middle = middle
        .into_iter()
        .zip(&upper)
        .map(|(m, u)| u.and(m))
        .collect();

    BollingerColumns {
        upper,
        middle,
        lower,
    }
}
