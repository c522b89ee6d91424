//! Small summary of the book used for status logging and queries.

use rust_decimal::Decimal;

/// Best prices and depth on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopOfBook {
    /// Best bid price, if any bid rests.
    pub best_bid: Option<Decimal>,
    /// Number of resting bids.
    pub bid_depth: usize,

    /// Best ask price, if any ask rests.
    pub best_ask: Option<Decimal>,
    /// Number of resting asks.
    pub ask_depth: usize,
}

impl TopOfBook {
    /// Returns `true` if there is *no* bid and *no* ask.
    pub fn is_empty(&self) -> bool {
        self.bid_depth == 0 && self.ask_depth == 0
    }

    /// Best ask minus best bid, when both sides are populated.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }
}
