//! Stateless risk statistics over return series.
//!
//! `metrics` holds the performance and distribution ratios, `var` the
//! value-at-risk family. Nothing here keeps state between calls.

pub mod metrics;
pub mod var;

pub use metrics::{DrawdownInfo, RiskReport, comprehensive_report};
pub use var::{HorizonScaling, VarConfig, VarReport, calculate_all_var};
