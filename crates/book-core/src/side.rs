//! Side (Bid / Ask) of a resting order.
//!
//! Orders do not carry an explicit side: it is derived from the sign of
//! the signed `amount`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Book side an order belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Classify a signed amount.
    ///
    /// Strictly positive amounts are bids; zero and negative amounts are
    /// asks. A zero amount therefore lands on the ask side.
    pub fn of(amount: Decimal) -> Self {
        if amount > Decimal::ZERO {
            Side::Bid
        } else {
            Side::Ask
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
