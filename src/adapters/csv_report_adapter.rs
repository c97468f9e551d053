//! CSV export of a finished backtest: `trades.csv` and `equity.csv`.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::QuantError;
use crate::ports::report_port::ReportPort;

pub const TRADES_FILE: &str = "trades.csv";
pub const EQUITY_FILE: &str = "equity.csv";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn csv_error(path: &Path, e: impl std::fmt::Display) -> QuantError {
    QuantError::Csv {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), QuantError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record([
        "trade_id",
        "ticker",
        "side",
        "entry_date",
        "exit_date",
        "entry_price",
        "exit_price",
        "quantity",
        "pnl",
        "pnl_percent",
        "commission",
    ])
    .map_err(|e| csv_error(path, e))?;

    for t in &result.trades {
        wtr.write_record([
            t.trade_id.clone(),
            t.ticker.clone(),
            t.side.to_string(),
            t.entry_date.to_string(),
            t.exit_date.to_string(),
            format!("{:.4}", t.entry_price),
            format!("{:.4}", t.exit_price),
            format!("{:.4}", t.quantity),
            format!("{:.4}", t.pnl),
            format!("{:.4}", t.pnl_percent),
            format!("{:.4}", t.commission),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), QuantError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record(["date", "equity", "cash", "signal"])
        .map_err(|e| csv_error(path, e))?;

    for point in &result.equity_curve {
        wtr.write_record([
            point.timestamp.to_string(),
            format!("{:.4}", point.equity),
            format!("{:.4}", point.cash),
            point.signal.to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), QuantError> {
        fs::create_dir_all(output_dir)?;
        write_trades(result, &output_dir.join(TRADES_FILE))?;
        write_equity(result, &output_dir.join(EQUITY_FILE))?;
        info!(
            dir = %output_dir.display(),
            trades = result.trades.len(),
            bars = result.equity_curve.len(),
            "report written"
        );
        Ok(())
    }
}
