#![allow(dead_code)]

use chrono::NaiveDate;
use quantdesk::domain::backtest::BacktestConfig;
use quantdesk::domain::error::QuantError;
use quantdesk::domain::indicator::IndicatorType;
pub use quantdesk::domain::ohlcv::OhlcvBar;
use quantdesk::domain::price_table::PriceTable;
pub use quantdesk::domain::signal::Signal;
use quantdesk::domain::strategy::Strategy;
use quantdesk::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, QuantError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(QuantError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.timestamp >= s))
                    .filter(|b| end_date.is_none_or(|e| b.timestamp <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, QuantError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Emits a preset signal column and buys a fixed quantity.
pub struct FixedSignalStrategy {
    pub signals: Vec<Signal>,
    pub quantity: f64,
}

impl FixedSignalStrategy {
    pub fn new(signals: Vec<Signal>, quantity: f64) -> Self {
        Self { signals, quantity }
    }
}

impl Strategy for FixedSignalStrategy {
    fn name(&self) -> &str {
        "Fixed Signals"
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        Vec::new()
    }

    fn generate_signals(&self, table: &PriceTable) -> Result<PriceTable, QuantError> {
        table.clone().with_signals(self.signals.clone())
    }

    fn calculate_position_size(&self, _table: &PriceTable, _capital: f64, _price: f64) -> f64 {
        self.quantity
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 100_000.0,
        commission_rate: 0.001,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn bar(ticker: &str, timestamp: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        ticker: ticker.to_string(),
        timestamp,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// One bar per day from `start_date` for every close in `closes`.
pub fn bars_from_closes(ticker: &str, start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| bar(ticker, start + chrono::Duration::days(i as i64), *c))
        .collect()
}

/// Linear uptrend of `count` daily bars starting at `start_price`.
pub fn generate_bars(
    ticker: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    bars_from_closes(ticker, start_date, &closes)
}

/// Deterministic oscillating series with a mild drift and a volume spike
/// every 17th bar.
pub fn generate_wave_bars(ticker: &str, start_date: &str, count: usize) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + 0.05 * t + 8.0 * (t / 6.0).sin();
            OhlcvBar {
                ticker: ticker.to_string(),
                timestamp: start + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: if i % 17 == 0 { 5000.0 } else { 1000.0 },
            }
        })
        .collect()
}

/// Wide closes CSV body for two assets over `rows` days.
pub fn two_asset_closes_csv(rows: usize) -> String {
    let mut out = String::from("date,AAA,BBB\n");
    let start = date(2024, 1, 1);
    let mut a = 100.0;
    let mut b = 50.0;
    for i in 0..rows {
        let d = start + chrono::Duration::days(i as i64);
        out.push_str(&format!("{d},{a:.4},{b:.4}\n"));
        let t = i as f64;
        a *= 1.0 + 0.001 + 0.01 * (t * 1.3).sin();
        b *= 1.0 + 0.0005 + 0.02 * (t * 0.7).cos();
    }
    out
}
