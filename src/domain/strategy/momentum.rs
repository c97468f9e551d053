//! RSI momentum strategy with a moving-average trend filter.
//!
//! Requires `RSI_{rsi_period}`, `SMA_{fast_ma}` and `SMA_{slow_ma}`.
//!
//! - BUY: RSI crosses above the oversold level (RSI[t-1] <= oversold < RSI[t])
//!   while SMA_fast > SMA_slow.
//! - SELL: RSI crosses above the overbought level, or SMA_fast crosses below
//!   SMA_slow.

use super::{fixed_fraction_size, ge, gt, prev, required_columns, signals_from, Strategy};
use crate::domain::error::QuantError;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_table::PriceTable;

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub fast_ma: usize,
    pub slow_ma: usize,
    pub position_size_pct: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        MomentumConfig {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            fast_ma: 50,
            slow_ma: 200,
            position_size_pct: super::DEFAULT_POSITION_SIZE_PCT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    config: MomentumConfig,
}

impl MomentumStrategy {
    pub fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MomentumConfig {
        &self.config
    }
}

impl Default for MomentumStrategy {
    fn default() -> Self {
        Self::new(MomentumConfig::default())
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        "Momentum Strategy"
    }

    fn fingerprint(&self) -> String {
        format!("{:?}", self.config)
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Rsi(self.config.rsi_period),
            IndicatorType::Sma(self.config.fast_ma),
            IndicatorType::Sma(self.config.slow_ma),
        ]
    }

    fn generate_signals(&self, table: &PriceTable) -> Result<PriceTable, QuantError> {
        table.require_columns(&required_columns(self))?;
        let rsi = table.column(&format!("RSI_{}", self.config.rsi_period))?;
        let fast = table.column(&format!("SMA_{}", self.config.fast_ma))?;
        let slow = table.column(&format!("SMA_{}", self.config.slow_ma))?;

        let oversold = Some(self.config.rsi_oversold);
        let overbought = Some(self.config.rsi_overbought);

        let signals = signals_from(
            table.len(),
            |i| {
                let uptrend = gt(fast[i], slow[i]);
                gt(rsi[i], oversold) && ge(oversold, prev(rsi, i)) && uptrend
            },
            |i| {
                let rsi_overbought = gt(rsi[i], overbought) && ge(overbought, prev(rsi, i));
                let bearish_cross = gt(slow[i], fast[i]) && ge(prev(fast, i), prev(slow, i));
                rsi_overbought || bearish_cross
            },
        );

        table.clone().with_signals(signals)
    }

    fn calculate_position_size(&self, _table: &PriceTable, capital: f64, current_price: f64) -> f64 {
        fixed_fraction_size(capital, self.config.position_size_pct, current_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::bars_from_closes;
    use crate::domain::signal::Signal;

    fn small_config() -> MomentumConfig {
        MomentumConfig {
            rsi_period: 2,
            fast_ma: 2,
            slow_ma: 3,
            ..Default::default()
        }
    }

    fn table_with(rsi: Vec<Option<f64>>, fast: Vec<Option<f64>>, slow: Vec<Option<f64>>) -> PriceTable {
        let closes = vec![100.0; rsi.len()];
        PriceTable::new(bars_from_closes(&closes))
            .unwrap()
            .with_column("RSI_2", rsi)
            .unwrap()
            .with_column("SMA_2", fast)
            .unwrap()
            .with_column("SMA_3", slow)
            .unwrap()
    }

    #[test]
    fn defaults() {
        let c = MomentumConfig::default();
        assert_eq!(c.rsi_period, 14);
        assert_eq!((c.fast_ma, c.slow_ma), (50, 200));
        assert!((c.position_size_pct - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_column_fails_fast() {
        let table = PriceTable::new(bars_from_closes(&[1.0, 2.0])).unwrap();
        let err = MomentumStrategy::new(small_config()).generate_signals(&table).unwrap_err();
        assert!(matches!(err, QuantError::MissingIndicator { column } if column == "RSI_2"));
    }

    #[test]
    fn buy_on_oversold_cross_in_uptrend() {
        let table = table_with(
            vec![Some(25.0), Some(35.0), Some(40.0)],
            vec![Some(11.0), Some(11.0), Some(11.0)],
            vec![Some(10.0), Some(10.0), Some(10.0)],
        );
        let out = MomentumStrategy::new(small_config()).generate_signals(&table).unwrap();
        assert_eq!(out.signals().unwrap(), &[Signal::Hold, Signal::Buy, Signal::Hold]);
    }

    #[test]
    fn no_buy_in_downtrend() {
        let table = table_with(
            vec![Some(25.0), Some(35.0)],
            vec![Some(9.0), Some(9.0)],
            vec![Some(10.0), Some(10.0)],
        );
        let out = MomentumStrategy::new(small_config()).generate_signals(&table).unwrap();
        assert_eq!(out.signals().unwrap(), &[Signal::Hold, Signal::Hold]);
    }

    #[test]
    fn sell_on_bearish_ma_cross() {
        let table = table_with(
            vec![Some(50.0), Some(50.0)],
            vec![Some(11.0), Some(9.0)],
            vec![Some(10.0), Some(10.0)],
        );
        let out = MomentumStrategy::new(small_config()).generate_signals(&table).unwrap();
        assert_eq!(out.signals().unwrap()[1], Signal::Sell);
    }

    #[test]
    fn sell_wins_when_both_conditions_hold() {
        // RSI crosses both oversold and overbought in one bar while trending up.
        let table = table_with(
            vec![Some(20.0), Some(80.0)],
            vec![Some(11.0), Some(11.0)],
            vec![Some(10.0), Some(10.0)],
        );
        let out = MomentumStrategy::new(small_config()).generate_signals(&table).unwrap();
        assert_eq!(out.signals().unwrap()[1], Signal::Sell);
    }

    #[test]
    fn warmup_nulls_hold() {
        let table = table_with(vec![None, None], vec![None, None], vec![None, None]);
        let out = MomentumStrategy::new(small_config()).generate_signals(&table).unwrap();
        assert!(out.signals().unwrap().iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn output_keeps_input_columns_only() {
        let table = table_with(vec![Some(50.0)], vec![Some(1.0)], vec![Some(1.0)]);
        let out = MomentumStrategy::new(small_config()).generate_signals(&table).unwrap();
        assert_eq!(out.column_names(), vec!["RSI_2", "SMA_2", "SMA_3"]);
    }
}
