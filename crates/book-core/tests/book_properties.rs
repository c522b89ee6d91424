// crates/book-core/tests/book_properties.rs
use book_core::{ClientId, LockRegistry, Order, OrderBook, OrderId};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Price in tenths between 0.1 and 50.0.
fn price() -> impl Strategy<Value = Decimal> {
    (1i64..=500).prop_map(|tenths| Decimal::new(tenths, 1))
}

/// Signed amount between -20 and 20, including zero.
fn amount() -> impl Strategy<Value = Decimal> {
    (-20i64..=20).prop_map(Decimal::from)
}

/// Orders with unique ids, presented in an arbitrary insertion order.
fn orders(max: usize) -> impl Strategy<Value = Vec<Order>> {
    prop::collection::vec((price(), amount()), 0..max).prop_flat_map(|specs| {
        let n = specs.len();
        let ids: Vec<u128> = (1..=n as u128).collect();
        Just(ids).prop_shuffle().prop_map(move |ids| {
            specs
                .iter()
                .zip(ids)
                .map(|((p, a), id)| Order::new(OrderId(Uuid::from_u128(id)), *p, *a))
                .collect()
        })
    })
}

fn assert_sorted(book: &OrderBook) {
    for pair in book.bids().iter().collect::<Vec<_>>().windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(a.price > b.price || (a.price == b.price && a.id < b.id));
    }
    for pair in book.asks().iter().collect::<Vec<_>>().windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(a.price < b.price || (a.price == b.price && a.id < b.id));
    }
    assert!(book.bids().iter().all(|o| o.amount > Decimal::ZERO));
    assert!(book.asks().iter().all(|o| o.amount <= Decimal::ZERO));
}

fn signed_total(book: &OrderBook) -> Decimal {
    book.snapshot().iter().map(|o| o.amount).sum()
}

proptest! {
    #[test]
    fn sides_stay_sorted_after_every_insert(orders in orders(60)) {
        let mut book = OrderBook::new();
        for order in orders {
            book.add_order(order);
            assert_sorted(&book);
        }
    }

    #[test]
    fn sides_stay_sorted_while_trading(orders in orders(60)) {
        let mut book = OrderBook::new();
        for order in orders {
            book.execute(order);
            assert_sorted(&book);
        }
    }

    #[test]
    fn matched_plus_leftover_equals_incoming(
        resting in orders(40),
        incoming_price in price(),
        incoming_amount in amount(),
    ) {
        let mut book = OrderBook::new();
        book.init(resting);
        let incoming = Order::new(OrderId(Uuid::from_u128(u128::MAX)), incoming_price, incoming_amount);

        let outcome = book.fulfill_order(&incoming);

        prop_assert_eq!(outcome.filled() + outcome.remaining.abs(), incoming_amount.abs());
        prop_assert!(outcome.fills.iter().all(|f| f.quantity > Decimal::ZERO));
    }

    #[test]
    fn signed_quantity_is_conserved_by_execute(
        resting in orders(40),
        incoming_price in price(),
        incoming_amount in amount(),
    ) {
        let mut book = OrderBook::new();
        book.init(resting);
        let before = signed_total(&book);
        let incoming = Order::new(OrderId(Uuid::from_u128(u128::MAX)), incoming_price, incoming_amount);

        book.execute(incoming);

        prop_assert_eq!(signed_total(&book), before + incoming_amount);
    }

    #[test]
    fn snapshot_round_trips_regardless_of_order(orders in orders(60)) {
        let mut book = OrderBook::new();
        for order in orders {
            book.add_order(order);
        }
        let snapshot = book.snapshot();

        let mut forward = OrderBook::new();
        forward.init(snapshot.clone());
        let mut reversed = OrderBook::new();
        reversed.init(snapshot.iter().rev().cloned());

        prop_assert_eq!(forward.snapshot(), snapshot.clone());
        prop_assert_eq!(reversed.snapshot(), snapshot);
        prop_assert_eq!(forward.len(), book.len());
    }

    #[test]
    fn repeated_lock_then_unlock_leaves_registry_open(locks in 1usize..8, unlocks in 1usize..8) {
        let mut registry = LockRegistry::new();
        let client = ClientId::new("127.0.0.1:1500");

        for _ in 0..locks {
            registry.lock(client.clone());
        }
        prop_assert!(registry.is_locked());
        prop_assert_eq!(registry.len(), 1);

        for _ in 0..unlocks {
            registry.unlock(&client);
        }
        prop_assert!(!registry.is_locked());
    }
}

#[test]
fn unlocking_an_absent_client_is_a_no_op() {
    let mut registry = LockRegistry::new();
    registry.lock(ClientId::new("a:1"));

    assert!(!registry.unlock(&ClientId::new("b:2")));
    assert!(registry.is_locked());
    assert!(registry.contains(&ClientId::new("a:1")));
}

#[test]
fn registry_stays_locked_until_every_client_unlocks() {
    let mut registry = LockRegistry::new();
    let a = ClientId::new("a:1");
    let b = ClientId::new("b:2");
    registry.lock(a.clone());
    registry.lock(b.clone());

    registry.unlock(&a);
    assert!(registry.is_locked());

    registry.unlock(&b);
    assert!(!registry.is_locked());
}
