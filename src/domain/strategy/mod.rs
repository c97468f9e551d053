//! Strategy capability set and shared signal helpers.
//!
//! A strategy turns an indicator-augmented [`PriceTable`] into the same table
//! with a signal column attached, and sizes new positions. Strategies hold
//! configuration only; open-position bookkeeping lives with the caller
//! (see [`crate::domain::position::PositionBook`]).

pub mod breakout;
pub mod mean_reversion;
pub mod momentum;

pub use breakout::{BreakoutConfig, BreakoutStrategy};
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
pub use momentum::{MomentumConfig, MomentumStrategy};

use std::fmt;
use std::str::FromStr;

use crate::domain::error::QuantError;
use crate::domain::indicator::IndicatorType;
use crate::domain::price_table::PriceTable;
use crate::domain::signal::Signal;

/// Default fraction of capital committed per position.
pub const DEFAULT_POSITION_SIZE_PCT: f64 = 0.1;

/// The strategy variants selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Momentum,
    MeanReversion,
    Breakout,
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "momentum" => Ok(StrategyKind::Momentum),
            "mean_reversion" => Ok(StrategyKind::MeanReversion),
            "breakout" => Ok(StrategyKind::Breakout),
            other => Err(format!(
                "unknown strategy '{other}', expected momentum, mean_reversion or breakout"
            )),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Momentum => write!(f, "momentum"),
            StrategyKind::MeanReversion => write!(f, "mean_reversion"),
            StrategyKind::Breakout => write!(f, "breakout"),
        }
    }
}

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Canonical rendering of every parameter that affects signals or sizing.
    /// Two configurations of the same strategy must render differently.
    fn fingerprint(&self) -> String {
        String::new()
    }

    /// Indicators whose columns must be present before [`Strategy::generate_signals`].
    fn required_indicators(&self) -> Vec<IndicatorType>;

    /// Return a copy of `table` with one signal per bar attached.
    ///
    /// Fails with `QuantError::MissingIndicator` if a required column is absent.
    fn generate_signals(&self, table: &PriceTable) -> Result<PriceTable, QuantError>;

    /// Quantity to buy given available capital and the current price. Never negative.
    fn calculate_position_size(&self, table: &PriceTable, capital: f64, current_price: f64) -> f64;
}

/// Column names a strategy's required indicators produce.
pub fn required_columns(strategy: &dyn Strategy) -> Vec<String> {
    strategy
        .required_indicators()
        .iter()
        .flat_map(IndicatorType::column_names)
        .collect()
}

/// Fixed-fractional sizing: `capital * pct / price`, or 0 for unusable inputs.
pub fn fixed_fraction_size(capital: f64, pct: f64, current_price: f64) -> f64 {
    if current_price <= 0.0 || capital <= 0.0 || !current_price.is_finite() {
        return 0.0;
    }
    (capital * pct / current_price).max(0.0)
}

/// Build the signal column row by row. SELL wins when both conditions hold.
pub(crate) fn signals_from<B, S>(len: usize, buy: B, sell: S) -> Vec<Signal>
where
    B: Fn(usize) -> bool,
    S: Fn(usize) -> bool,
{
    (0..len)
        .map(|i| Signal::from_conditions(buy(i), sell(i)))
        .collect()
}

/// `a > b`, false when either side is null.
pub(crate) fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

/// `a >= b`, false when either side is null.
pub(crate) fn ge(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a >= b)
}

/// Value of the previous row, `None` on the first row.
pub(crate) fn prev(column: &[Option<f64>], i: usize) -> Option<f64> {
    if i == 0 { None } else { column[i - 1] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fraction_basic() {
        let qty = fixed_fraction_size(100_000.0, 0.1, 50.0);
        assert!((qty - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fixed_fraction_rejects_bad_price() {
        assert_eq!(fixed_fraction_size(100_000.0, 0.1, 0.0), 0.0);
        assert_eq!(fixed_fraction_size(100_000.0, 0.1, -5.0), 0.0);
        assert_eq!(fixed_fraction_size(-1.0, 0.1, 5.0), 0.0);
    }

    #[test]
    fn null_comparisons_are_false() {
        assert!(!gt(None, Some(1.0)));
        assert!(!ge(Some(1.0), None));
        assert!(ge(Some(1.0), Some(1.0)));
    }

    #[test]
    fn strategy_kind_parses() {
        assert_eq!("Mean_Reversion".parse::<StrategyKind>().unwrap(), StrategyKind::MeanReversion);
        assert_eq!(StrategyKind::Breakout.to_string(), "breakout");
        assert!("scalping".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn signals_from_applies_sell_priority() {
        let signals = signals_from(3, |i| i != 1, |i| i == 0);
        assert_eq!(signals, vec![Signal::Sell, Signal::Hold, Signal::Buy]);
    }
}
