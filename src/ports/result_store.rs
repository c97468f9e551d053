//! Persistence port for completed backtest runs.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::QuantError;

/// Storage for finished runs. The engine calls [`ResultStore::save_backtest`]
/// once per successful run and only logs a failure.
pub trait ResultStore {
    fn save_backtest(&self, result: &BacktestResult) -> Result<(), QuantError>;
}
