//! Limit order book with price-time priority.
//!
//! - Bids: descending by price (best = highest), ties by ascending id.
//! - Asks: ascending by price (best = lowest), ties by ascending id.
//!
//! Each side is a single fully sorted deque of orders rather than a map
//! of price levels: the book is small, replicas exchange it as one flat
//! list, and the matching loop only ever touches the front. Inserts find
//! their slot with a binary search (`partition_point`) and pay an O(n)
//! shift.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::messages::{Fill, MatchOutcome};
use crate::order::Order;
use crate::side::Side;
use crate::top_of_book::TopOfBook;

/// Single-instrument order book.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// Resting buys, every `amount > 0`.
    bids: VecDeque<Order>,

    /// Resting sells, every `amount <= 0`.
    asks: VecDeque<Order>,
}

impl OrderBook {
    /// Create a new, empty order book.
    pub fn new() -> Self {
        OrderBook::default()
    }

    /// Rebuild the book from a peer snapshot.
    ///
    /// Both sides are cleared first and every order is re-inserted, so
    /// the input order does not matter. Only meant for join time, before
    /// this node starts trading.
    pub fn init<I>(&mut self, snapshot: I)
    where
        I: IntoIterator<Item = Order>,
    {
        self.bids.clear();
        self.asks.clear();
        for order in snapshot {
            self.add_order(order);
        }
    }

    /// Insert a resting order on the side given by the sign of its amount.
    pub fn add_order(&mut self, order: Order) {
        match order.side() {
            Side::Bid => {
                let idx = self.bids.partition_point(|o| bid_ranks_before(o, &order));
                self.bids.insert(idx, order);
            }
            Side::Ask => {
                let idx = self.asks.partition_point(|o| ask_ranks_before(o, &order));
                self.asks.insert(idx, order);
            }
        }
    }

    /// Match an incoming order against the opposite side.
    ///
    /// Consumes resting orders best-first while they cross the incoming
    /// price. A resting order larger than what is left to match is resized
    /// in place and stays at the front. The incoming order itself is never
    /// inserted here; see [`OrderBook::execute`].
    pub fn fulfill_order(&mut self, order: &Order) -> MatchOutcome {
        let mut matched = Vec::new();
        let mut fills = Vec::new();
        let mut remaining = order.amount;

        match order.side() {
            Side::Bid => {
                // Buy: walk asks upwards while they are at or below our price.
                while remaining > Decimal::ZERO {
                    let best = match self.asks.front_mut() {
                        Some(o) => o,
                        None => break,
                    };
                    if best.price > order.price {
                        break;
                    }

                    let available = -best.amount;
                    let (maker, price) = (best.id, best.price);

                    if remaining < available {
                        best.amount += remaining;
                        fills.push(Fill { maker, price, quantity: remaining });
                        remaining = Decimal::ZERO;
                    } else {
                        remaining -= available;
                        if available > Decimal::ZERO {
                            fills.push(Fill { maker, price, quantity: available });
                        }
                        if let Some(consumed) = self.asks.pop_front() {
                            matched.push(consumed);
                        }
                    }
                }
            }
            Side::Ask => {
                // Sell: walk bids downwards while they are at or above our price.
                while remaining < Decimal::ZERO {
                    let best = match self.bids.front_mut() {
                        Some(o) => o,
                        None => break,
                    };
                    if order.price > best.price {
                        break;
                    }

                    let available = best.amount;
                    let need = -remaining;
                    let (maker, price) = (best.id, best.price);

                    if need < available {
                        best.amount -= need;
                        fills.push(Fill { maker, price, quantity: need });
                        remaining = Decimal::ZERO;
                    } else {
                        remaining += available;
                        fills.push(Fill { maker, price, quantity: available });
                        if let Some(consumed) = self.bids.pop_front() {
                            matched.push(consumed);
                        }
                    }
                }
            }
        }

        if remaining.is_zero() {
            matched.push(order.clone());
        }

        MatchOutcome {
            matched,
            fills,
            remaining,
        }
    }

    /// Match an order and rest whatever is left of it.
    ///
    /// A partially filled order rests at its original price with its
    /// amount replaced by the unmatched remainder.
    pub fn execute(&mut self, mut order: Order) -> MatchOutcome {
        let outcome = self.fulfill_order(&order);

        if !outcome.remaining.is_zero() {
            order.amount = outcome.remaining;
            self.add_order(order);
        }

        outcome
    }

    /// Same as [`OrderBook::execute`], reporting only whether anything
    /// matched.
    pub fn place_market_order(&mut self, order: Order) -> bool {
        self.execute(order).is_fulfilled()
    }

    /// Copy of every resting order: bids (best first) then asks (best first).
    pub fn snapshot(&self) -> Vec<Order> {
        self.bids.iter().chain(self.asks.iter()).cloned().collect()
    }

    /// Total number of resting orders.
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn bids(&self) -> &VecDeque<Order> {
        &self.bids
    }

    pub fn asks(&self) -> &VecDeque<Order> {
        &self.asks
    }

    pub fn best_bid(&self) -> Option<&Order> {
        self.bids.front()
    }

    pub fn best_ask(&self) -> Option<&Order> {
        self.asks.front()
    }

    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            best_bid: self.best_bid().map(|o| o.price),
            bid_depth: self.bids.len(),
            best_ask: self.best_ask().map(|o| o.price),
            ask_depth: self.asks.len(),
        }
    }
}

// -----------------------------------------------------------------------------
// Ordering predicates for the binary search
// -----------------------------------------------------------------------------

/// `resting` sorts strictly before `incoming` on the bid side.
fn bid_ranks_before(resting: &Order, incoming: &Order) -> bool {
    resting.price > incoming.price || (resting.price == incoming.price && resting.id < incoming.id)
}

/// `resting` sorts strictly before `incoming` on the ask side.
fn ask_ranks_before(resting: &Order, incoming: &Order) -> bool {
    resting.price < incoming.price || (resting.price == incoming.price && resting.id < incoming.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderId;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn id(n: u128) -> OrderId {
        OrderId(Uuid::from_u128(n))
    }

    #[test]
    fn equal_prices_are_ordered_by_id_on_both_sides() {
        let mut book = OrderBook::new();
        book.add_order(Order::new(id(3), dec!(10), dec!(1)));
        book.add_order(Order::new(id(1), dec!(10), dec!(1)));
        book.add_order(Order::new(id(2), dec!(10), dec!(1)));
        book.add_order(Order::new(id(6), dec!(10), dec!(-1)));
        book.add_order(Order::new(id(4), dec!(10), dec!(-1)));
        book.add_order(Order::new(id(5), dec!(10), dec!(-1)));

        let bid_ids: Vec<_> = book.bids().iter().map(|o| o.id).collect();
        let ask_ids: Vec<_> = book.asks().iter().map(|o| o.id).collect();
        assert_eq!(bid_ids, vec![id(1), id(2), id(3)]);
        assert_eq!(ask_ids, vec![id(4), id(5), id(6)]);
    }

    #[test]
    fn zero_amount_rests_on_the_ask_side() {
        let mut book = OrderBook::new();
        book.add_order(Order::new(id(1), dec!(10), dec!(0)));

        assert_eq!(book.bids().len(), 0);
        assert_eq!(book.asks().len(), 1);
    }

    #[test]
    fn top_of_book_reports_best_prices_and_depth() {
        let mut book = OrderBook::new();
        book.add_order(Order::new(id(1), dec!(99), dec!(2)));
        book.add_order(Order::new(id(2), dec!(98), dec!(1)));
        book.add_order(Order::new(id(3), dec!(101), dec!(-1)));

        let tob = book.top_of_book();
        assert_eq!(tob.best_bid, Some(dec!(99)));
        assert_eq!(tob.best_ask, Some(dec!(101)));
        assert_eq!(tob.bid_depth, 2);
        assert_eq!(tob.ask_depth, 1);
        assert_eq!(tob.spread(), Some(dec!(2)));
    }
}
