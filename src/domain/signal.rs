//! Per-bar trading decision.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// Resolve the buy and sell conditions of one bar. SELL wins when both hold.
    pub fn from_conditions(buy: bool, sell: bool) -> Self {
        if sell {
            Signal::Sell
        } else if buy {
            Signal::Buy
        } else {
            Signal::Hold
        }
    }

    /// +1 / -1 / 0 encoding used in stored equity history.
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}
