//! Price/volume breakout strategy.
//!
//! Works from raw OHLCV only:
//! - resistance = max(high) over the previous `lookback` bars
//! - support = min(low) over the previous `lookback` bars
//! - avg_volume = mean(volume) over the last `lookback` bars, current included
//!
//! - BUY: close > resistance and volume > avg_volume * volume_multiplier.
//! - SELL: close < support.
//!
//! Working series are local; the returned table only gains the signal column.

use super::{fixed_fraction_size, gt, signals_from, Strategy};
use crate::domain::error::QuantError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_helpers::{rolling_max, rolling_mean, rolling_min, shift_one};
use crate::domain::price_table::PriceTable;

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutConfig {
    pub lookback: usize,
    pub volume_multiplier: f64,
    pub position_size_pct: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        BreakoutConfig {
            lookback: 20,
            volume_multiplier: 1.5,
            position_size_pct: super::DEFAULT_POSITION_SIZE_PCT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    config: BreakoutConfig,
}

impl BreakoutStrategy {
    pub fn new(config: BreakoutConfig) -> Self {
        Self { config }
    }
}

impl Default for BreakoutStrategy {
    fn default() -> Self {
        Self::new(BreakoutConfig::default())
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        "Breakout Strategy"
    }

    fn fingerprint(&self) -> String {
        format!("{:?}", self.config)
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        Vec::new()
    }

    fn generate_signals(&self, table: &PriceTable) -> Result<PriceTable, QuantError> {
        let bars = table.bars();
        let lookback = self.config.lookback;
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let resistance = shift_one(&rolling_max(&highs, lookback));
        let support = shift_one(&rolling_min(&lows, lookback));
        let avg_volume = rolling_mean(&volumes, lookback);
        let multiplier = self.config.volume_multiplier;

        let signals = signals_from(
            table.len(),
            |i| {
                let close = Some(bars[i].close);
                let high_volume = gt(Some(volumes[i]), avg_volume[i].map(|v| v * multiplier));
                gt(close, resistance[i]) && high_volume
            },
            |i| gt(support[i], Some(bars[i].close)),
        );

        table.clone().with_signals(signals)
    }

    fn calculate_position_size(&self, _table: &PriceTable, capital: f64, current_price: f64) -> f64 {
        fixed_fraction_size(capital, self.config.position_size_pct, current_price)
    }
}
