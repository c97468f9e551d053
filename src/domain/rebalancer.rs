//! Target-weight rebalancing for a [`Portfolio`].
//!
//! Targets are percentages of total value keyed by ticker. Orders below
//! `min_trade_value` are skipped. Holdings absent from the targets are
//! liquidated in full.

use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use super::portfolio::{Portfolio, TransactionKind};

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceConfig {
    /// Smallest order notional worth sending.
    pub min_trade_value: f64,
    /// Drift in percentage points that triggers a threshold rebalance.
    pub threshold_pct: f64,
    /// Flat commission per order.
    pub commission: f64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        RebalanceConfig {
            min_trade_value: 100.0,
            threshold_pct: 5.0,
            commission: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceOrder {
    pub ticker: String,
    pub action: TransactionKind,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedOrder {
    pub ticker: String,
    pub action: TransactionKind,
    pub quantity: f64,
    pub price: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Rebalancer {
    config: RebalanceConfig,
}

impl Rebalancer {
    pub fn new(config: RebalanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// Orders that move `portfolio` to `targets` at `prices`.
    ///
    /// Marks the portfolio to `prices` first. Tickers without a price are
    /// skipped, except full liquidations which use the holding's last price.
    pub fn calculate_trades(
        &self,
        portfolio: &mut Portfolio,
        targets: &BTreeMap<String, f64>,
        prices: &HashMap<String, f64>,
    ) -> Vec<RebalanceOrder> {
        portfolio.update_prices(prices);
        let total_value = portfolio.total_value();
        let current = portfolio.allocation();

        let mut orders = Vec::new();
        for (ticker, target) in targets {
            let weight_diff = target - current.get(ticker).copied().unwrap_or(0.0);
            let value_diff = weight_diff / 100.0 * total_value;
            if value_diff.abs() < self.config.min_trade_value {
                continue;
            }
            let Some(price) = prices.get(ticker).copied().filter(|p| *p > 0.0) else {
                continue;
            };
            orders.push(RebalanceOrder {
                ticker: ticker.clone(),
                action: if value_diff > 0.0 {
                    TransactionKind::Buy
                } else {
                    TransactionKind::Sell
                },
                quantity: value_diff.abs() / price,
            });
        }

        for (ticker, holding) in portfolio.holdings() {
            if !targets.contains_key(ticker) {
                orders.push(RebalanceOrder {
                    ticker: ticker.clone(),
                    action: TransactionKind::Sell,
                    quantity: holding.quantity(),
                });
            }
        }
        orders
    }

    /// Calculate and execute orders, sells before buys. Orders the portfolio
    /// rejects are logged and skipped.
    pub fn execute_rebalance(
        &self,
        portfolio: &mut Portfolio,
        targets: &BTreeMap<String, f64>,
        prices: &HashMap<String, f64>,
    ) -> Vec<ExecutedOrder> {
        let mut orders = self.calculate_trades(portfolio, targets, prices);
        orders.sort_by_key(|o| o.action == TransactionKind::Buy);

        let mut executed = Vec::with_capacity(orders.len());
        for order in orders {
            let price = prices
                .get(&order.ticker)
                .copied()
                .or_else(|| portfolio.holding(&order.ticker).map(|h| h.current_price()));
            let Some(price) = price else {
                warn!(ticker = %order.ticker, "no price for order, skipping");
                continue;
            };

            let result = match order.action {
                TransactionKind::Buy => {
                    portfolio.buy(&order.ticker, order.quantity, price, self.config.commission)
                }
                TransactionKind::Sell => {
                    portfolio.sell(&order.ticker, order.quantity, price, self.config.commission)
                }
            };
            match result {
                Ok(()) => executed.push(ExecutedOrder {
                    value: order.quantity * price,
                    ticker: order.ticker,
                    action: order.action,
                    quantity: order.quantity,
                    price,
                }),
                Err(e) => {
                    warn!(ticker = %order.ticker, action = %order.action, quantity = order.quantity, error = %e, "rebalance order failed");
                }
            }
        }
        info!(orders = executed.len(), "rebalance executed");
        executed
    }

    /// True if any target's drift from its current weight exceeds the
    /// configured threshold.
    pub fn periodic_rebalance(
        &self,
        portfolio: &mut Portfolio,
        targets: &BTreeMap<String, f64>,
        prices: &HashMap<String, f64>,
    ) -> bool {
        portfolio.update_prices(prices);
        let current = portfolio.allocation();
        targets.iter().any(|(ticker, target)| {
            (target - current.get(ticker).copied().unwrap_or(0.0)).abs() > self.config.threshold_pct
        })
    }

    /// Rebalance only when [`Rebalancer::periodic_rebalance`] reports drift.
    pub fn threshold_rebalance(
        &self,
        portfolio: &mut Portfolio,
        targets: &BTreeMap<String, f64>,
        prices: &HashMap<String, f64>,
    ) -> Vec<ExecutedOrder> {
        if self.periodic_rebalance(portfolio, targets, prices) {
            self.execute_rebalance(portfolio, targets, prices)
        } else {
            Vec::new()
        }
    }
}
