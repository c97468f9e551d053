//! Result export port.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::QuantError;

/// Writes a finished run somewhere a human or another tool can read it.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), QuantError>;
}
