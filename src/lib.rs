//! quantdesk: single-asset strategy backtesting, portfolio risk analytics,
//! mean-variance optimization and target-weight rebalancing.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
