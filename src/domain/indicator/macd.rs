//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! - Line: EMA(fast) - EMA(slow)
//! - Signal: EMA(signal) of the MACD line
//! - Histogram: line - signal
//!
//! Default parameters: fast=12, slow=26, signal=9. The underlying EMAs are
//! defined from the first bar, so all three columns are too.

use crate::domain::indicator_helpers::ewm_mean;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub line: Column,
    pub signal: Column,
    pub histogram: Column,
}

pub fn calculate_macd(bars: &[OhlcvBar], fast: usize, slow: usize, signal: usize) -> MacdColumns {
    if fast == 0 || slow == 0 || signal == 0 {
        let empty = vec![None; bars.len()];
        return MacdColumns {
            line: empty.clone(),
            signal: empty.clone(),
            histogram: empty,
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let fast_ema = ewm_mean(&closes, fast);
    let slow_ema = ewm_mean(&closes, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ewm_mean(&line, signal);

    MacdColumns {
        histogram: line
            .iter()
            .zip(&signal_line)
            .map(|(l, s)| Some(l - s))
            .collect(),
        line: line.into_iter().map(Some).collect(),
        signal: signal_line.into_iter().map(Some).collect(),
    }
}

pub fn calculate_macd_default(bars: &[OhlcvBar]) -> MacdColumns {
    calculate_macd(bars, 12, 26, 9)
}
