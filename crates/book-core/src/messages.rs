//! Inputs and results of the matching engine.
//!
//! These are **transport-agnostic** logical types:
//! - [`NewOrder`]: what a submitter sends (no id yet).
//! - [`MatchOutcome`] / [`Fill`]: what a matching pass produces.
//!
//! Wire envelopes live in the `book-protocol` crate; this module is
//! purely logical.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderId};

/// A new order as submitted by a node: price and signed amount.
///
/// The id is attached by the receiving node (see [`NewOrder::with_id`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl NewOrder {
    pub fn new(price: Decimal, amount: Decimal) -> Self {
        NewOrder { price, amount }
    }

    /// Turn the submission into a book order under the given id.
    pub fn with_id(&self, id: impl Into<OrderId>) -> Order {
        Order::new(id, self.price, self.amount)
    }
}

/// One execution against a resting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// Resting order that provided the liquidity.
    pub maker: OrderId,

    /// Execution price: the resting order's price.
    pub price: Decimal,

    /// Executed quantity (always positive).
    pub quantity: Decimal,
}

/// Result of one matching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Resting orders consumed in full, followed by the incoming order
    /// itself when it was completely filled.
    ///
    /// A resting order that was only resized does not appear here; it
    /// shows up in `fills` instead.
    pub matched: Vec<Order>,

    /// Every execution, in matching order.
    pub fills: Vec<Fill>,

    /// Signed quantity of the incoming order left unmatched.
    pub remaining: Decimal,
}

impl MatchOutcome {
    /// True when anything was matched (the reported "fulfilled" flag).
    pub fn is_fulfilled(&self) -> bool {
        !self.matched.is_empty()
    }

    /// Total executed quantity.
    pub fn filled(&self) -> Decimal {
        self.fills.iter().map(|f| f.quantity).sum()
    }
}
