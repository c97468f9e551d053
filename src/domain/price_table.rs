//! Time-ordered price table with indicator and signal columns.
//!
//! A `PriceTable` is immutable in use: every stage that adds a column takes
//! the table by value and returns a new one. Indicator columns are nullable
//! (`None` during an indicator's warmup window).

use chrono::NaiveDate;

use super::error::QuantError;
use super::ohlcv::OhlcvBar;
use super::signal::Signal;

pub type Column = Vec<Option<f64>>;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    bars: Vec<OhlcvBar>,
    columns: Vec<(String, Column)>,
    signals: Option<Vec<Signal>>,
}

impl PriceTable {
    /// Build a table from bars. Timestamps must be strictly increasing.
    pub fn new(bars: Vec<OhlcvBar>) -> Result<Self, QuantError> {
        if let Some(w) = bars.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(QuantError::InvalidPriceTable {
                reason: format!(
                    "timestamps not strictly increasing at {} -> {}",
                    w[0].timestamp, w[1].timestamp
                ),
            });
        }
        Ok(Self {
            bars,
            columns: Vec::new(),
            signals: None,
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.timestamp)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&[Option<f64>], QuantError> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_slice())
            .ok_or_else(|| QuantError::MissingIndicator {
                column: name.to_string(),
            })
    }

    /// Fail with the first absent column, in the order given.
    pub fn require_columns(&self, names: &[String]) -> Result<(), QuantError> {
        for name in names {
            if !self.has_column(name) {
                return Err(QuantError::MissingIndicator {
                    column: name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Append (or replace) a named column.
    pub fn with_column(mut self, name: impl Into<String>, values: Column) -> Result<Self, QuantError> {
        let name = name.into();
        if values.len() != self.bars.len() {
            return Err(QuantError::InvalidPriceTable {
                reason: format!(
                    "column {} has {} rows, table has {}",
                    name,
                    values.len(),
                    self.bars.len()
                ),
            });
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
        Ok(self)
    }

    pub fn signals(&self) -> Option<&[Signal]> {
        self.signals.as_deref()
    }

    /// Attach the signal column, one signal per bar.
    pub fn with_signals(mut self, signals: Vec<Signal>) -> Result<Self, QuantError> {
        if signals.len() != self.bars.len() {
            return Err(QuantError::InvalidPriceTable {
                reason: format!(
                    "signal column has {} rows, table has {}",
                    signals.len(),
                    self.bars.len()
                ),
            });
        }
        self.signals = Some(signals);
        Ok(self)
    }
}
