//! Bollinger-band mean reversion strategy.
//!
//! Requires `BB_upper`, `BB_middle`, `BB_lower`.
//!
//! - BUY: close <= lower band.
//! - SELL: close >= upper band, or the previous close was below the middle
//!   band and the current close is at or above it.

use super::{fixed_fraction_size, ge, gt, prev, required_columns, signals_from, Strategy};
use crate::domain::error::QuantError;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_table::PriceTable;

#[derive(Debug, Clone, PartialEq)]
pub struct MeanReversionConfig {
    pub bb_period: usize,
    pub bb_std: f64,
    pub position_size_pct: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        MeanReversionConfig {
            bb_period: 20,
            bb_std: 2.0,
            position_size_pct: super::DEFAULT_POSITION_SIZE_PCT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
}

impl MeanReversionStrategy {
    pub fn new(config: MeanReversionConfig) -> Self {
        Self { config }
    }
}

impl Default for MeanReversionStrategy {
    fn default() -> Self {
        Self::new(MeanReversionConfig::default())
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        "Mean Reversion Strategy"
    }

    fn fingerprint(&self) -> String {
        format!("{:?}", self.config)
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![IndicatorType::Bollinger {
            period: self.config.bb_period,
            stddev_mult_x100: (self.config.bb_std * 100.0).round() as u32,
        }]
    }

    fn generate_signals(&self, table: &PriceTable) -> Result<PriceTable, QuantError> {
        table.require_columns(&required_columns(self))?;
        let upper = table.column("BB_upper")?;
        let middle = table.column("BB_middle")?;
        let lower = table.column("BB_lower")?;
        let close: Vec<Option<f64>> = table.closes().into_iter().map(Some).collect();

        let signals = signals_from(
            table.len(),
            |i| ge(lower[i], close[i]),
            |i| {
                let at_upper = ge(close[i], upper[i]);
                let reverted = gt(middle[i], prev(&close, i)) && ge(close[i], middle[i]);
                at_upper || reverted
            },
        );

        table.clone().with_signals(signals)
    }

    fn calculate_position_size(&self, _table: &PriceTable, capital: f64, current_price: f64) -> f64 {
        fixed_fraction_size(capital, self.config.position_size_pct, current_price)
    }
}
