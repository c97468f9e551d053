//! Multi-asset price and return matrices.
//!
//! Rows are time steps, columns are assets. Both types validate that every row
//! has one value per ticker and that values are finite.

use chrono::NaiveDate;

use super::error::QuantError;
use super::stats;

/// Wide table of closing prices, one column per ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    timestamps: Vec<NaiveDate>,
    tickers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl PriceMatrix {
    pub fn new(
        timestamps: Vec<NaiveDate>,
        tickers: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, QuantError> {
        if timestamps.len() != rows.len() {
            return Err(QuantError::InvalidReturns {
                reason: format!("{} timestamps for {} rows", timestamps.len(), rows.len()),
            });
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(QuantError::InvalidReturns {
                reason: "timestamps must be strictly increasing".into(),
            });
        }
        check_shape(&tickers, &rows)?;
        Ok(Self {
            timestamps,
            tickers,
            rows,
        })
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Last row of prices keyed by ticker.
    pub fn latest_prices(&self) -> Vec<(String, f64)> {
        match self.rows.last() {
            Some(row) => self.tickers.iter().cloned().zip(row.iter().copied()).collect(),
            None => Vec::new(),
        }
    }

    /// Simple per-asset returns; the result has one row fewer.
    pub fn returns(&self) -> Result<ReturnsMatrix, QuantError> {
        let rows = self
            .rows
            .windows(2)
            .map(|w| {
                w[0].iter()
                    .zip(&w[1])
                    .map(|(prev, cur)| if *prev != 0.0 { (cur - prev) / prev } else { 0.0 })
                    .collect()
            })
            .collect();
        ReturnsMatrix::new(self.tickers.clone(), rows)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsMatrix {
    tickers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ReturnsMatrix {
    pub fn new(tickers: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, QuantError> {
        check_shape(&tickers, &rows)?;
        Ok(Self { tickers, rows })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_assets(&self) -> usize {
        self.tickers.len()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column(&self, asset: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[asset]).collect()
    }

    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.n_assets()).map(|i| self.column(i)).collect()
    }

    /// Per-row weighted sum. Weights are fractions in asset order.
    pub fn portfolio_returns(&self, weights: &[f64]) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.iter().zip(weights).map(|(x, w)| x * w).sum())
            .collect()
    }

    pub fn mean_returns(&self) -> Vec<f64> {
        self.columns().iter().map(|c| stats::mean(c)).collect()
    }

    /// Sample covariance matrix (n - 1 denominator).
    pub fn covariance(&self) -> Vec<Vec<f64>> {
        let cols = self.columns();
        cols.iter()
            .map(|a| cols.iter().map(|b| stats::sample_cov(a, b)).collect())
            .collect()
    }

    /// Pearson correlation matrix. Assets with zero variance correlate 0 with
    /// everything except themselves.
    pub fn correlation_matrix(&self) -> Vec<Vec<f64>> {
        let cov = self.covariance();
        let n = cov.len();
        (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            1.0
                        } else {
                            stats::safe_div(cov[i][j], (cov[i][i] * cov[j][j]).sqrt())
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

fn check_shape(tickers: &[String], rows: &[Vec<f64>]) -> Result<(), QuantError> {
    if tickers.is_empty() {
        return Err(QuantError::InvalidReturns {
            reason: "no assets".into(),
        });
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != tickers.len() {
            return Err(QuantError::InvalidReturns {
                reason: format!("row {i} has {} values for {} assets", row.len(), tickers.len()),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(QuantError::InvalidReturns {
                reason: format!("row {i} contains a non-finite value"),
            });
        }
    }
    Ok(())
}
