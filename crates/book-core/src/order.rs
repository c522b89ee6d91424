//! Order representation shared by the book, the snapshot exchange and
//! the wire protocol.
//!
//! An order is `{ id, price, amount }`:
//! - `id` is assigned by the receiving node from the request's
//!   correlation id, never by the submitter, so every replica that
//!   receives the same broadcast stores the same id.
//! - `amount` is signed: `> 0` is a buy, `<= 0` is a sell. Its magnitude
//!   is the outstanding quantity.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::side::Side;

/// Opaque, totally ordered order identifier.
///
/// Wraps a UUIDv7, so ids minted later compare greater; this is what
/// makes the id tie-break inside a price level behave like time priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        OrderId(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single order, resting or incoming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Signed outstanding quantity.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl Order {
    pub fn new(id: impl Into<OrderId>, price: Decimal, amount: Decimal) -> Self {
        Order {
            id: id.into(),
            price,
            amount,
        }
    }

    /// Side derived from the sign of `amount`.
    pub fn side(&self) -> Side {
        Side::of(self.amount)
    }
}
