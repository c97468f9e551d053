//! CSV file data adapter.
//!
//! OHLCV files live at `{base_path}/{TICKER}.csv` with a
//! `date,open,high,low,close,volume` header. Multi-asset price matrices are
//! wide files: a `date` column followed by one close column per ticker.

use crate::domain::error::QuantError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::returns::PriceMatrix;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn csv_error(path: &Path, reason: impl Into<String>) -> QuantError {
    QuantError::Csv {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn parse_date(path: &Path, value: &str) -> Result<NaiveDate, QuantError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| csv_error(path, format!("invalid date '{}': {}", value, e)))
}

fn parse_field(
    path: &Path,
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, QuantError> {
    record
        .get(index)
        .ok_or_else(|| csv_error(path, format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| csv_error(path, format!("invalid {} value: {}", name, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, QuantError> {
        let path = self.csv_path(ticker);
        if !path.exists() {
            return Err(QuantError::NoData {
                ticker: ticker.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(&path, e.to_string()))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| csv_error(&path, "missing date column"))?;
            let date = parse_date(&path, date_str)?;

            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(OhlcvBar {
                ticker: ticker.to_string(),
                timestamp: date,
                open: parse_field(&path, &record, 1, "open")?,
                high: parse_field(&path, &record, 2, "high")?,
                low: parse_field(&path, &record, 3, "low")?,
                close: parse_field(&path, &record, 4, "close")?,
                volume: parse_field(&path, &record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, QuantError> {
        let mut tickers = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        tickers.sort();
        Ok(tickers)
    }
}

/// Read a wide closes file into a [`PriceMatrix`]. Rows are sorted by date.
pub fn read_price_matrix(path: &Path) -> Result<PriceMatrix, QuantError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| csv_error(path, e.to_string()))?;

    let headers = rdr.headers().map_err(|e| csv_error(path, e.to_string()))?;
    if headers.len() < 2 {
        return Err(csv_error(path, "expected a date column and at least one ticker"));
    }
    let tickers: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut dated_rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(path, e.to_string()))?;
        let date = parse_date(path, record.get(0).unwrap_or_default())?;
        let row = tickers
            .iter()
            .enumerate()
            .map(|(i, ticker)| parse_field(path, &record, i + 1, ticker))
            .collect::<Result<Vec<f64>, QuantError>>()?;
        dated_rows.push((date, row));
    }
    dated_rows.sort_by_key(|(date, _)| *date);

    let (timestamps, rows): (Vec<NaiveDate>, Vec<Vec<f64>>) = dated_rows.into_iter().unzip();
    PriceMatrix::new(timestamps, tickers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("AAPL.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not market data").unwrap();

        (dir, path)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_ohlcv_returns_sorted_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("AAPL", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, day(15));
        assert_eq!(bars[0].ticker, "AAPL");
        assert!((bars[0].open - 100.0).abs() < f64::EPSILON);
        assert!((bars[0].close - 105.0).abs() < f64::EPSILON);
        assert!((bars[0].volume - 50000.0).abs() < f64::EPSILON);
        assert_eq!(bars[2].timestamp, day(17));
    }

    #[test]
    fn fetch_ohlcv_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("AAPL", Some(day(16)), Some(day(16))).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp, day(16));

        let bars = adapter.fetch_ohlcv("AAPL", Some(day(16)), None).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn fetch_ohlcv_missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_ohlcv("XYZ", None, None).unwrap_err();
        assert!(matches!(err, QuantError::NoData { ticker } if ticker == "XYZ"));
    }

    #[test]
    fn fetch_ohlcv_bad_value_is_csv_error() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_ohlcv("BAD", None, None).unwrap_err();
        assert!(matches!(err, QuantError::Csv { reason, .. } if reason.contains("open")));
    }

    #[test]
    fn list_tickers_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.list_tickers().unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn read_price_matrix_parses_wide_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("closes.csv");
        fs::write(
            &path,
            "date,AAPL,MSFT\n2024-01-16,102.0,201.0\n2024-01-15,100.0,200.0\n",
        )
        .unwrap();

        let matrix = read_price_matrix(&path).unwrap();
        assert_eq!(matrix.tickers(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(matrix.timestamps(), &[day(15), day(16)]);
        assert!((matrix.rows()[1][0] - 102.0).abs() < f64::EPSILON);

        let returns = matrix.returns().unwrap();
        assert!((returns.rows()[0][0] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn read_price_matrix_rejects_date_only_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("closes.csv");
        fs::write(&path, "date\n2024-01-15\n").unwrap();

        assert!(matches!(
            read_price_matrix(&path),
            Err(QuantError::Csv { .. })
        ));
    }
}
