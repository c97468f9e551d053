//! Volume Weighted Average Price indicator.
//!
//! VWAP[i] = cumsum(typical_price * V) / cumsum(V) over bars 0..=i.
//! `None` while cumulative volume is zero.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::Column;

pub fn calculate_vwap(bars: &[OhlcvBar]) -> Column {
    let mut pv = 0.0;
    let mut vol = 0.0;
    bars.iter()
        .map(|bar| {
            pv += bar.typical_price() * bar.volume;
            vol += bar.volume;
            if vol == 0.0 { None } else { Some(pv / vol) }
        })
        .collect()
}
