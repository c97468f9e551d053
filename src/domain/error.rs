//! Domain error types.
//!
//! Market outcomes (insufficient cash inside a backtest, zero trades, no
//! rebalance drift) are never errors; everything here is a precondition or
//! I/O failure the caller must be able to tell apart from "nothing happened".

/// Top-level error type for quantdesk.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    #[error("missing indicator column {column}")]
    MissingIndicator { column: String },

    #[error("invalid price table: {reason}")]
    InvalidPriceTable { reason: String },

    #[error("invalid returns: {reason}")]
    InvalidReturns { reason: String },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("insufficient shares of {ticker}: hold {held}, requested {requested}")]
    InsufficientShares {
        ticker: String,
        held: f64,
        requested: f64,
    },

    #[error("no holding for {ticker}")]
    NoHolding { ticker: String },

    #[error("insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("csv error in {path}: {reason}")]
    Csv { path: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuantError {
    pub(crate) fn invalid_order(reason: impl Into<String>) -> Self {
        QuantError::InvalidOrder {
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        QuantError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&QuantError> for std::process::ExitCode {
    fn from(err: &QuantError) -> Self {
        let code: u8 = match err {
            QuantError::Io(_) | QuantError::Csv { .. } => 1,
            QuantError::ConfigParse { .. }
            | QuantError::ConfigMissing { .. }
            | QuantError::ConfigInvalid { .. } => 2,
            QuantError::Database { .. } | QuantError::DatabaseQuery { .. } => 3,
            QuantError::MissingIndicator { .. }
            | QuantError::InvalidOrder { .. }
            | QuantError::InsufficientShares { .. }
            | QuantError::NoHolding { .. }
            | QuantError::InsufficientFunds { .. } => 4,
            QuantError::NoData { .. }
            | QuantError::InvalidPriceTable { .. }
            | QuantError::InvalidReturns { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitCode;

    #[test]
    fn missing_indicator_names_the_column() {
        let err = QuantError::MissingIndicator {
            column: "RSI_14".into(),
        };
        assert_eq!(err.to_string(), "missing indicator column RSI_14");
    }

    #[test]
    fn insufficient_funds_formats_amounts() {
        let err = QuantError::InsufficientFunds {
            needed: 1500.5,
            available: 1000.0,
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: need 1500.50, have 1000.00"
        );
    }

    #[test]
    fn exit_codes_group_by_failure_class() {
        let config = QuantError::config_invalid("risk", "confidence", "out of range");
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));

        let order = QuantError::NoHolding {
            ticker: "AAPL".into(),
        };
        assert_eq!(ExitCode::from(&order), ExitCode::from(4));

        let data = QuantError::NoData {
            ticker: "AAPL".into(),
        };
        assert_eq!(ExitCode::from(&data), ExitCode::from(5));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: QuantError = io.into();
        assert!(matches!(err, QuantError::Io(_)));
    }
}
