//! Open positions, closed trades, and per-ticker position bookkeeping.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub side: Side,
    pub entry_commission: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    /// Unrealized profit at `price`, before commissions.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => (price - self.entry_price) * self.quantity,
            Side::Short => (self.entry_price - price) * self.quantity,
        }
    }

    /// Price move relative to entry, in percent. Excludes commission.
    pub fn pnl_percent(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        let pct = (price - self.entry_price) / self.entry_price * 100.0;
        match self.side {
            Side::Long => pct,
            Side::Short => -pct,
        }
    }
}

/// Immutable record of one closed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub trade_id: String,
    pub ticker: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub side: Side,
    /// Net of entry and exit commission.
    pub pnl: f64,
    /// Price move only, commission excluded.
    pub pnl_percent: f64,
    /// Entry plus exit commission.
    pub commission: f64,
}

/// At most one open position per ticker.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    positions: HashMap<String, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a position. Returns false (and keeps the existing one) if the
    /// ticker already has an open position.
    pub fn add_position(&mut self, position: Position) -> bool {
        if self.positions.contains_key(&position.ticker) {
            return false;
        }
        self.positions.insert(position.ticker.clone(), position);
        true
    }

    pub fn close_position(&mut self, ticker: &str) -> Option<Position> {
        self.positions.remove(ticker)
    }

    pub fn get_position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    pub fn has_position(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_long_position() -> Position {
        Position {
            ticker: "AAPL".into(),
            quantity: 100.0,
            entry_price: 50.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            side: Side::Long,
            entry_commission: 5.0,
        }
    }

    #[test]
    fn market_value_long() {
        let pos = sample_long_position();
        assert!((pos.market_value(55.0) - 5500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_long_profit() {
        let pos = sample_long_position();
        assert!((pos.unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_short_profit() {
        let pos = Position {
            side: Side::Short,
            ..sample_long_position()
        };
        assert!((pos.unrealized_pnl(45.0) - 500.0).abs() < f64::EPSILON);
        assert!(!pos.is_long());
    }

    #[test]
    fn pnl_percent_excludes_commission() {
        let pos = sample_long_position();
        assert!((pos.pnl_percent(60.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn book_rejects_second_position_for_ticker() {
        let mut book = PositionBook::new();
        assert!(book.add_position(sample_long_position()));
        let pyramid = Position {
            quantity: 10.0,
            ..sample_long_position()
        };
        assert!(!book.add_position(pyramid));
        assert_eq!(book.len(), 1);
        assert!((book.get_position("AAPL").unwrap().quantity - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn close_removes_position() {
        let mut book = PositionBook::new();
        book.add_position(sample_long_position());
        let closed = book.close_position("AAPL").unwrap();
        assert_eq!(closed.ticker, "AAPL");
        assert!(!book.has_position("AAPL"));
        assert!(book.close_position("AAPL").is_none());
    }

    #[test]
    fn side_display() {
        assert_eq!(Side::Long.to_string(), "long");
        assert_eq!(Side::Short.to_string(), "short");
    }
}
