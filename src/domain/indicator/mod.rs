//! Technical indicator pipeline.
//!
//! Each indicator is a pure function from bars to one or more nullable
//! columns. `IndicatorType` identifies an indicator with its parameters and
//! knows the column names it produces; [`apply_indicators`] appends those
//! columns to a [`PriceTable`].
//!
//! Column naming: `{INDICATOR}_{period}` for single-parameter indicators
//! (`SMA_20`, `RSI_14`, `ATR_14`), fixed names for the rest (`MACD`,
//! `MACD_signal`, `MACD_hist`, `BB_upper`, `BB_middle`, `BB_lower`, `OBV`,
//! `VWAP`).

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod mfi;
pub mod obv;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod vwap;

use std::fmt;

use crate::domain::error::QuantError;
use crate::domain::price_table::{Column, PriceTable};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Roc(usize),
    Atr(usize),
    Adx(usize),
    Mfi(usize),
    Obv,
    Vwap,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// Names of the columns this indicator appends, in output order.
    pub fn column_names(&self) -> Vec<String> {
        match self {
            IndicatorType::Sma(p) => vec![format!("SMA_{p}")],
            IndicatorType::Ema(p) => vec![format!("EMA_{p}")],
            IndicatorType::Rsi(p) => vec![format!("RSI_{p}")],
            IndicatorType::Roc(p) => vec![format!("ROC_{p}")],
            IndicatorType::Atr(p) => vec![format!("ATR_{p}")],
            IndicatorType::Adx(p) => vec![format!("ADX_{p}")],
            IndicatorType::Mfi(p) => vec![format!("MFI_{p}")],
            IndicatorType::Obv => vec!["OBV".into()],
            IndicatorType::Vwap => vec!["VWAP".into()],
            IndicatorType::Macd { .. } => {
                vec!["MACD".into(), "MACD_signal".into(), "MACD_hist".into()]
            }
            IndicatorType::Bollinger { .. } => {
                vec!["BB_upper".into(), "BB_middle".into(), "BB_lower".into()]
            }
        }
    }

    fn compute(&self, table: &PriceTable) -> Vec<Column> {
        let bars = table.bars();
        match self {
            IndicatorType::Sma(p) => vec![sma::calculate_sma(bars, *p)],
            IndicatorType::Ema(p) => vec![ema::calculate_ema(bars, *p)],
            IndicatorType::Rsi(p) => vec![rsi::calculate_rsi(bars, *p)],
            IndicatorType::Roc(p) => vec![roc::calculate_roc(bars, *p)],
            IndicatorType::Atr(p) => vec![atr::calculate_atr(bars, *p)],
            IndicatorType::Adx(p) => vec![adx::calculate_adx(bars, *p)],
            IndicatorType::Mfi(p) => vec![mfi::calculate_mfi(bars, *p)],
            IndicatorType::Obv => vec![obv::calculate_obv(bars)],
            IndicatorType::Vwap => vec![vwap::calculate_vwap(bars)],
            IndicatorType::Macd { fast, slow, signal } => {
                let m = macd::calculate_macd(bars, *fast, *slow, *signal);
                vec![m.line, m.signal, m.histogram]
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let b = bollinger::calculate_bollinger(bars, *period, *stddev_mult_x100);
                vec![b.upper, b.middle, b.lower]
            }
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Mfi(period) => write!(f, "MFI({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Append every indicator's columns to the table, skipping duplicates.
pub fn apply_indicators(
    table: PriceTable,
    indicators: &[IndicatorType],
) -> Result<PriceTable, QuantError> {
    let mut table = table;
    for indicator in indicators {
        let names = indicator.column_names();
        if names.iter().all(|n| table.has_column(n)) {
            continue;
        }
        let columns = indicator.compute(&table);
        for (name, column) in names.into_iter().zip(columns) {
            table = table.with_column(name, column)?;
        }
    }
    Ok(table)
}


#[cfg(test)]
mod tests {
    use super::test_support::bars_from_closes;
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn column_names_follow_convention() {
        assert_eq!(IndicatorType::Rsi(14).column_names(), vec!["RSI_14"]);
        assert_eq!(
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
            .column_names(),
            vec!["BB_upper", "BB_middle", "BB_lower"]
        );
    }

    #[test]
    fn apply_indicators_appends_columns() {
        let table = PriceTable::new(bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let table = apply_indicators(
            table,
            &[IndicatorType::Sma(2), IndicatorType::Rsi(3), IndicatorType::Obv],
        )
        .unwrap();
        assert_eq!(table.column_names(), vec!["SMA_2", "RSI_3", "OBV"]);
        assert_eq!(table.column("SMA_2").unwrap()[1], Some(1.5));
    }

    #[test]
    fn apply_indicators_skips_existing_columns() {
        let table = PriceTable::new(bars_from_closes(&[1.0, 2.0, 3.0])).unwrap();
        let table = apply_indicators(table, &[IndicatorType::Sma(2), IndicatorType::Sma(2)]).unwrap();
        assert_eq!(table.column_names(), vec!["SMA_2"]);
    }
}
