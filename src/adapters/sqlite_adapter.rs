//! SQLite adapter: OHLCV storage plus the backtest run store.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::QuantError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{Side, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::result_store::ResultStore;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Summary row of a stored backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRun {
    pub run_id: String,
    pub strategy_name: String,
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub num_trades: usize,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
}

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> QuantError {
    QuantError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> QuantError {
    QuantError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date_column(value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            value.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, QuantError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| QuantError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, QuantError> {
        // a single connection keeps every caller on the same in-memory database
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(pool_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, QuantError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn initialize_schema(&self) -> Result<(), QuantError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ohlcv (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                PRIMARY KEY (ticker, date)
            );
            CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);

            CREATE TABLE IF NOT EXISTS backtest_runs (
                run_id TEXT PRIMARY KEY,
                strategy_name TEXT NOT NULL,
                ticker TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                initial_capital REAL NOT NULL,
                final_value REAL NOT NULL,
                total_return REAL NOT NULL,
                total_return_pct REAL NOT NULL,
                num_trades INTEGER NOT NULL,
                win_rate REAL NOT NULL,
                sharpe_ratio REAL NOT NULL,
                sortino_ratio REAL NOT NULL,
                max_drawdown_pct REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS trades (
                trade_id TEXT PRIMARY KEY,
                run_id TEXT NOT NULL REFERENCES backtest_runs(run_id) ON DELETE CASCADE,
                ticker TEXT NOT NULL,
                side TEXT NOT NULL,
                entry_date TEXT NOT NULL,
                exit_date TEXT NOT NULL,
                entry_price REAL NOT NULL,
                exit_price REAL NOT NULL,
                quantity REAL NOT NULL,
                pnl REAL NOT NULL,
                pnl_percent REAL NOT NULL,
                commission REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_run ON trades(run_id);",
        )
        .map_err(query_err)?;

        Ok(())
    }

    pub fn insert_bars(&self, bars: &[OhlcvBar]) -> Result<(), QuantError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (ticker, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.ticker,
                    bar.timestamp.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        debug!(bars = bars.len(), "ohlcv bars stored");
        Ok(())
    }

    /// Stored runs, most recent end date first.
    pub fn list_runs(&self) -> Result<Vec<StoredRun>, QuantError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT run_id, strategy_name, ticker, start_date, end_date, initial_capital,
                        final_value, total_return_pct, num_trades, sharpe_ratio, max_drawdown_pct
                 FROM backtest_runs
                 ORDER BY end_date DESC, run_id ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                let num_trades: i64 = row.get(8)?;
                Ok(StoredRun {
                    run_id: row.get(0)?,
                    strategy_name: row.get(1)?,
                    ticker: row.get(2)?,
                    start_date: parse_date_column(row.get(3)?)?,
                    end_date: parse_date_column(row.get(4)?)?,
                    initial_capital: row.get(5)?,
                    final_value: row.get(6)?,
                    total_return_pct: row.get(7)?,
                    num_trades: num_trades.max(0) as usize,
                    sharpe_ratio: row.get(9)?,
                    max_drawdown_pct: row.get(10)?,
                })
            })
            .map_err(query_err)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }

    /// Trade ledger of one stored run, in close order.
    pub fn fetch_trades(&self, run_id: &str) -> Result<Vec<Trade>, QuantError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT trade_id, ticker, side, entry_date, exit_date, entry_price, exit_price,
                        quantity, pnl, pnl_percent, commission
                 FROM trades
                 WHERE run_id = ?1
                 ORDER BY trade_id ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                let side: String = row.get(2)?;
                Ok(Trade {
                    trade_id: row.get(0)?,
                    ticker: row.get(1)?,
                    side: if side == "short" { Side::Short } else { Side::Long },
                    entry_date: parse_date_column(row.get(3)?)?,
                    exit_date: parse_date_column(row.get(4)?)?,
                    entry_price: row.get(5)?,
                    exit_price: row.get(6)?,
                    quantity: row.get(7)?,
                    pnl: row.get(8)?,
                    pnl_percent: row.get(9)?,
                    commission: row.get(10)?,
                })
            })
            .map_err(query_err)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }
}

impl ResultStore for SqliteAdapter {
    /// Insert or replace the run summary and its trades in one transaction.
    fn save_backtest(&self, result: &BacktestResult) -> Result<(), QuantError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        let m = &result.metrics;

        tx.execute(
            "DELETE FROM trades WHERE run_id = ?1",
            params![result.run_id.0],
        )
        .map_err(query_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO backtest_runs (
                run_id, strategy_name, ticker, start_date, end_date, initial_capital,
                final_value, total_return, total_return_pct, num_trades, win_rate,
                sharpe_ratio, sortino_ratio, max_drawdown_pct)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                result.run_id.0,
                result.strategy_name,
                result.ticker,
                result.start_date.format(DATE_FORMAT).to_string(),
                result.end_date.format(DATE_FORMAT).to_string(),
                result.initial_capital,
                result.final_value,
                result.total_return,
                result.total_return_pct,
                m.num_trades as i64,
                m.win_rate,
                m.sharpe_ratio,
                m.sortino_ratio,
                m.max_drawdown_pct
            ],
        )
        .map_err(query_err)?;

        for t in &result.trades {
            tx.execute(
                "INSERT INTO trades (
                    trade_id, run_id, ticker, side, entry_date, exit_date, entry_price,
                    exit_price, quantity, pnl, pnl_percent, commission)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    t.trade_id,
                    result.run_id.0,
                    t.ticker,
                    t.side.to_string(),
                    t.entry_date.format(DATE_FORMAT).to_string(),
                    t.exit_date.format(DATE_FORMAT).to_string(),
                    t.entry_price,
                    t.exit_price,
                    t.quantity,
                    t.pnl,
                    t.pnl_percent,
                    t.commission
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        debug!(run_id = %result.run_id.short(), trades = result.trades.len(), "backtest run stored");
        Ok(())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, QuantError> {
        let conn = self.conn()?;

        // ISO dates sort lexically, so open bounds become the extreme strings
        let start_str = start_date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "0000-01-01".into());
        let end_str = end_date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "9999-12-31".into());

        let query = "SELECT ticker, date, open, high, low, close, volume
                     FROM ohlcv
                     WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(query_err)?;

        let rows = stmt
            .query_map(params![ticker, start_str, end_str], |row| {
                Ok(OhlcvBar {
                    ticker: row.get(0)?,
                    timestamp: parse_date_column(row.get(1)?)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(query_err)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }

    fn list_tickers(&self) -> Result<Vec<String>, QuantError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM ohlcv ORDER BY ticker")
            .map_err(query_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;
        rows.collect::<rusqlite::Result<Vec<String>>>().map_err(query_err)
    }
}
