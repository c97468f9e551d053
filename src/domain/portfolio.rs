//! Multi-holding portfolio ledger.
//!
//! Independent of the backtest loop. Cash and holdings change only through
//! [`Portfolio::buy`], [`Portfolio::sell`] and [`Portfolio::update_prices`];
//! each accepted trade appends one [`Transaction`]. Holding weights are
//! refreshed after every mutation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::error::QuantError;

/// Quantities within this relative distance of the held amount close the
/// holding entirely.
const QUANTITY_EPSILON: f64 = 1e-9;
/// Rounding overshoot tolerated when a buy spends all remaining cash.
const CASH_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    ticker: String,
    quantity: f64,
    avg_price: f64,
    current_price: f64,
    weight: f64,
}

impl Holding {
    fn new(ticker: &str, quantity: f64, price: f64) -> Self {
        Holding {
            ticker: ticker.to_string(),
            quantity,
            avg_price: price,
            current_price: price,
            weight: 0.0,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Quantity-weighted average of purchase prices. Commission is not part
    /// of it; commissions reduce cash only.
    pub fn avg_price(&self) -> f64 {
        self.avg_price
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn market_value(&self) -> f64 {
        self.quantity * self.current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.avg_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.market_value() - self.cost_basis()
    }

    pub fn unrealized_pnl_pct(&self) -> f64 {
        let basis = self.cost_basis();
        if basis > 0.0 {
            self.unrealized_pnl() / basis * 100.0
        } else {
            0.0
        }
    }

    /// Share of portfolio total value, in percent.
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "BUY"),
            TransactionKind::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    pub commission: f64,
    /// Cash paid (buy, commission included) or received (sell, net).
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub name: String,
    pub total_value: f64,
    pub cash: f64,
    pub invested_value: f64,
    pub total_pnl: f64,
    pub total_return_pct: f64,
    pub num_positions: usize,
    pub cash_weight: f64,
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    name: String,
    initial_capital: f64,
    cash: f64,
    holdings: BTreeMap<String, Holding>,
    transactions: Vec<Transaction>,
}

impl Portfolio {
    pub fn new(name: impl Into<String>, initial_capital: f64) -> Self {
        Portfolio {
            name: name.into(),
            initial_capital,
            cash: initial_capital,
            holdings: BTreeMap::new(),
            transactions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holdings(&self) -> &BTreeMap<String, Holding> {
        &self.holdings
    }

    pub fn holding(&self, ticker: &str) -> Option<&Holding> {
        self.holdings.get(ticker)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Cash plus the market value of every holding.
    pub fn total_value(&self) -> f64 {
        self.cash + self.holdings.values().map(Holding::market_value).sum::<f64>()
    }

    /// Cost basis of all holdings.
    pub fn invested_value(&self) -> f64 {
        self.holdings.values().map(Holding::cost_basis).sum()
    }

    /// Unrealized pnl across holdings.
    pub fn total_pnl(&self) -> f64 {
        self.holdings.values().map(Holding::unrealized_pnl).sum()
    }

    pub fn total_return_pct(&self) -> f64 {
        if self.initial_capital > 0.0 {
            (self.total_value() - self.initial_capital) / self.initial_capital * 100.0
        } else {
            0.0
        }
    }

    /// Weight per held ticker, in percent of total value.
    pub fn allocation(&self) -> BTreeMap<String, f64> {
        self.holdings
            .iter()
            .map(|(t, h)| (t.clone(), h.weight))
            .collect()
    }

    pub fn cash_weight(&self) -> f64 {
        let total = self.total_value();
        if total > 0.0 { self.cash / total * 100.0 } else { 0.0 }
    }

    /// Buy `quantity` at `price` paying a flat `commission`.
    ///
    /// A repeat buy averages the entry price by quantity; commission affects
    /// cash only. Fails without mutation if cost plus commission exceeds cash.
    pub fn buy(
        &mut self,
        ticker: &str,
        quantity: f64,
        price: f64,
        commission: f64,
    ) -> Result<(), QuantError> {
        validate_order(ticker, quantity, price, commission)?;

        let cost = quantity * price + commission;
        if cost > self.cash + CASH_EPSILON {
            return Err(QuantError::InsufficientFunds {
                needed: cost,
                available: self.cash,
            });
        }

        match self.holdings.get_mut(ticker) {
            Some(h) => {
                let total_quantity = h.quantity + quantity;
                h.avg_price = (h.quantity * h.avg_price + quantity * price) / total_quantity;
                h.quantity = total_quantity;
            }
            None => {
                self.holdings
                    .insert(ticker.to_string(), Holding::new(ticker, quantity, price));
            }
        }
        // within CASH_EPSILON of the balance the buy spends it all
        self.cash = (self.cash - cost).max(0.0);
        self.record(TransactionKind::Buy, ticker, quantity, price, commission, cost);
        Ok(())
    }

    /// Sell `quantity` at `price` paying a flat `commission`.
    pub fn sell(
        &mut self,
        ticker: &str,
        quantity: f64,
        price: f64,
        commission: f64,
    ) -> Result<(), QuantError> {
        validate_order(ticker, quantity, price, commission)?;

        let proceeds = quantity * price - commission;
        if self.cash + proceeds < 0.0 {
            return Err(QuantError::InsufficientFunds {
                needed: -proceeds,
                available: self.cash,
            });
        }

        let Some(h) = self.holdings.get_mut(ticker) else {
            return Err(QuantError::NoHolding {
                ticker: ticker.to_string(),
            });
        };

        let slack = QUANTITY_EPSILON * h.quantity.max(1.0);
        if quantity > h.quantity + slack {
            return Err(QuantError::InsufficientShares {
                ticker: ticker.to_string(),
                held: h.quantity,
                requested: quantity,
            });
        }

        if (h.quantity - quantity).abs() <= slack {
            self.holdings.remove(ticker);
        } else {
            h.quantity -= quantity;
        }

        self.cash += proceeds;
        self.record(TransactionKind::Sell, ticker, quantity, price, commission, proceeds);
        Ok(())
    }

    /// Mark holdings to the given prices. Tickers not held are ignored.
    pub fn update_prices(&mut self, prices: &HashMap<String, f64>) {
        for (ticker, holding) in self.holdings.iter_mut() {
            if let Some(price) = prices.get(ticker) {
                holding.current_price = *price;
            }
        }
        self.refresh_weights();
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            name: self.name.clone(),
            total_value: self.total_value(),
            cash: self.cash,
            invested_value: self.invested_value(),
            total_pnl: self.total_pnl(),
            total_return_pct: self.total_return_pct(),
            num_positions: self.holdings.len(),
            cash_weight: self.cash_weight(),
        }
    }

    fn record(
        &mut self,
        kind: TransactionKind,
        ticker: &str,
        quantity: f64,
        price: f64,
        commission: f64,
        value: f64,
    ) {
        debug!(%kind, ticker, quantity, price, cash = self.cash, "portfolio transaction");
        self.transactions.push(Transaction {
            timestamp: Utc::now(),
            kind,
            ticker: ticker.to_string(),
            quantity,
            price,
            commission,
            value,
        });
        self.refresh_weights();
    }

    fn refresh_weights(&mut self) {
        let total = self.total_value();
        for h in self.holdings.values_mut() {
            h.weight = if total > 0.0 {
                h.market_value() / total * 100.0
            } else {
                0.0
            };
        }
    }
}

fn validate_order(ticker: &str, quantity: f64, price: f64, commission: f64) -> Result<(), QuantError> {
    if ticker.trim().is_empty() {
        return Err(QuantError::invalid_order("ticker must not be empty"));
    }
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(QuantError::invalid_order(format!("quantity must be positive, got {quantity}")));
    }
    if !(price.is_finite() && price > 0.0) {
        return Err(QuantError::invalid_order(format!("price must be positive, got {price}")));
    }
    if !(commission.is_finite() && commission >= 0.0) {
        return Err(QuantError::invalid_order(format!("commission must be non-negative, got {commission}")));
    }
    Ok(())
}
