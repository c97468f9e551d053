//! Deterministic identifiers for backtest runs and trades.
//!
//! Ids are BLAKE3 digests of a canonical description of the run inputs, so
//! running the same strategy over the same data yields identical ids.

use std::fmt;

use super::price_table::PriceTable;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(pub String);

impl RunId {
    /// Hash strategy identity and parameters, ticker, capital settings, and
    /// every bar's OHLCV.
    pub fn derive(
        strategy_name: &str,
        strategy_params: &str,
        ticker: &str,
        table: &PriceTable,
        initial_capital: f64,
        commission_rate: f64,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        let header = format!(
            "strategy={strategy_name};params={strategy_params};ticker={ticker};bars={};capital={initial_capital};commission={commission_rate};",
            table.len()
        );
        hasher.update(header.as_bytes());
        for bar in table.bars() {
            hasher.update(bar.timestamp.to_string().as_bytes());
            for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                hasher.update(&v.to_le_bytes());
            }
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Short prefix used in trade ids and log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }

    /// Id of the `seq`-th trade closed in this run (1-based).
    pub fn trade_id(&self, seq: usize) -> String {
        format!("{}-{:04}", self.short(), seq)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
