//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod ids;
pub mod indicator;
pub mod indicator_helpers;
pub mod metrics;
pub mod ohlcv;
pub mod optimizer;
pub mod portfolio;
pub mod position;
pub mod price_table;
pub mod rebalancer;
pub mod returns;
pub mod risk;
pub mod signal;
pub mod stats;
pub mod strategy;
