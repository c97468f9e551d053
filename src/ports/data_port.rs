//! Market data source port.

use crate::domain::error::QuantError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `ticker` within the inclusive date range, oldest first.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, QuantError>;

    fn list_tickers(&self) -> Result<Vec<String>, QuantError>;
}
