//! Backtest engine and event loop.
//!
//! One engine simulates one strategy against one ticker's price table. All
//! mutable state (cash, open position, ledger, equity history) is reset at the
//! start of every [`BacktestEngine::run`], so an engine can be reused.

use chrono::NaiveDate;
use tracing::{debug, info, info_span, warn};

use super::error::QuantError;
use super::ids::RunId;
use super::metrics::PerformanceMetrics;
use super::position::{Position, PositionBook, Side, Trade};
use super::price_table::PriceTable;
use super::signal::Signal;
use super::strategy::Strategy;
use crate::ports::result_store::ResultStore;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Proportional commission applied to entry and exit notional.
    pub commission_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            commission_rate: 0.001,
        }
    }
}

/// Portfolio value as of a bar, recorded before that bar's signal is acted on.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDate,
    pub equity: f64,
    pub cash: f64,
    pub signal: Signal,
}

/// Terminal snapshot of one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub run_id: RunId,
    pub strategy_name: String,
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

pub struct BacktestEngine {
    strategy: Box<dyn Strategy>,
    config: BacktestConfig,
    store: Option<Box<dyn ResultStore + Send>>,
    cash: f64,
    positions: PositionBook,
    trades: Vec<Trade>,
    equity_history: Vec<EquityPoint>,
}

impl BacktestEngine {
    pub fn new(strategy: Box<dyn Strategy>, config: BacktestConfig) -> Self {
        let cash = config.initial_capital;
        Self {
            strategy,
            config,
            store: None,
            cash,
            positions: PositionBook::new(),
            trades: Vec::new(),
            equity_history: Vec::new(),
        }
    }

    /// Persist every successful run to `store`.
    pub fn with_store(mut self, store: Box<dyn ResultStore + Send>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Simulate the strategy over `table` for `ticker`.
    ///
    /// Steps:
    /// 1. Reset state and generate signals once for the whole table
    /// 2. For each bar: record equity, then act on the bar's signal
    ///    (BUY opens a position if none is open and cash covers cost plus
    ///    commission; SELL closes an open position)
    /// 3. Force-close any open position at the last close
    /// 4. Compute metrics, persist, and return the result
    ///
    /// Fails if the table is empty or the strategy rejects the table.
    pub fn run(&mut self, table: &PriceTable, ticker: &str) -> Result<BacktestResult, QuantError> {
        self.reset();

        let (Some(start_date), Some(end_date)) = (table.first_timestamp(), table.last_timestamp())
        else {
            return Err(QuantError::NoData {
                ticker: ticker.to_string(),
            });
        };

        let run_id = RunId::derive(
            self.strategy.name(),
            &self.strategy.fingerprint(),
            ticker,
            table,
            self.config.initial_capital,
            self.config.commission_rate,
        );
        let span = info_span!(
            "backtest",
            run_id = %run_id.short(),
            strategy = self.strategy.name(),
            ticker
        );
        let _entered = span.enter();

        let signaled = self.strategy.generate_signals(table)?;
        let signals = signaled
            .signals()
            .ok_or_else(|| QuantError::InvalidPriceTable {
                reason: format!("{} produced no signal column", self.strategy.name()),
            })?
            .to_vec();

        for (bar, signal) in signaled.bars().iter().zip(&signals) {
            let equity = self.mark_to_market(ticker, bar.close);
            self.equity_history.push(EquityPoint {
                timestamp: bar.timestamp,
                equity,
                cash: self.cash,
                signal: *signal,
            });

            match signal {
                Signal::Buy if !self.positions.has_position(ticker) => {
                    self.try_enter(&signaled, ticker, bar.close, bar.timestamp);
                }
                Signal::Sell if self.positions.has_position(ticker) => {
                    self.exit(ticker, bar.close, bar.timestamp, &run_id);
                }
                _ => {}
            }
        }

        if let Some(last) = signaled.bars().last() {
            if self.positions.has_position(ticker) {
                debug!(date = %last.timestamp, price = last.close, "force-closing open position");
                self.exit(ticker, last.close, last.timestamp, &run_id);
            }
        }

        let final_value = self.cash;
        let initial = self.config.initial_capital;
        let total_return = final_value - initial;
        let total_return_pct = if initial > 0.0 {
            total_return / initial * 100.0
        } else {
            0.0
        };

        let result = BacktestResult {
            run_id,
            strategy_name: self.strategy.name().to_string(),
            ticker: ticker.to_string(),
            start_date,
            end_date,
            initial_capital: initial,
            final_value,
            total_return,
            total_return_pct,
            metrics: PerformanceMetrics::calculate(&self.equity_history, &self.trades),
            trades: self.trades.clone(),
            equity_curve: self.equity_history.clone(),
        };

        info!(
            trades = result.trades.len(),
            final_value = result.final_value,
            return_pct = result.total_return_pct,
            "backtest complete"
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.save_backtest(&result) {
                warn!(error = %e, "failed to persist backtest result");
            }
        }

        Ok(result)
    }

    fn reset(&mut self) {
        self.cash = self.config.initial_capital;
        self.positions.clear();
        self.trades.clear();
        self.equity_history.clear();
    }

    fn mark_to_market(&self, ticker: &str, close: f64) -> f64 {
        match self.positions.get_position(ticker) {
            Some(pos) => self.cash + pos.market_value(close),
            None => self.cash,
        }
    }

    fn try_enter(&mut self, table: &PriceTable, ticker: &str, price: f64, date: NaiveDate) {
        let quantity = self.strategy.calculate_position_size(table, self.cash, price);
        if !(quantity.is_finite() && quantity > 0.0) {
            debug!(%date, quantity, "position size not positive, skipping entry");
            return;
        }

        let cost = quantity * price;
        let commission = cost * self.config.commission_rate;
        if cost + commission > self.cash {
            debug!(%date, needed = cost + commission, cash = self.cash, "insufficient cash, skipping entry");
            return;
        }

        self.cash -= cost + commission;
        self.positions.add_position(Position {
            ticker: ticker.to_string(),
            quantity,
            entry_price: price,
            entry_date: date,
            side: Side::Long,
            entry_commission: commission,
        });
        debug!(%date, quantity, price, commission, "entered long");
    }

    fn exit(&mut self, ticker: &str, price: f64, date: NaiveDate, run_id: &RunId) {
        let Some(position) = self.positions.close_position(ticker) else {
            return;
        };

        let gross = position.quantity * price;
        let exit_commission = gross * self.config.commission_rate;
        self.cash += gross - exit_commission;

        let commission = position.entry_commission + exit_commission;
        let pnl = (price - position.entry_price) * position.quantity - commission;

        let trade = Trade {
            trade_id: run_id.trade_id(self.trades.len() + 1),
            ticker: position.ticker.clone(),
            entry_date: position.entry_date,
            exit_date: date,
            entry_price: position.entry_price,
            exit_price: price,
            quantity: position.quantity,
            side: position.side,
            pnl,
            pnl_percent: position.pnl_percent(price),
            commission,
        };
        debug!(%date, price, pnl, "exited long");
        self.trades.push(trade);
    }
}
