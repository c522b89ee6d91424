//! Demo traffic: submit a random order at a fixed period.

use std::sync::Arc;
use std::time::Duration;

use book_core::NewOrder;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::coordinator::Coordinator;

/// Price in `90.00..=110.00`, amount of 1 to 5 units on a random side.
pub fn random_order<R: Rng>(rng: &mut R) -> NewOrder {
    let price = Decimal::new(rng.gen_range(9_000i64..=11_000), 2);
    let size = Decimal::from(rng.gen_range(1i64..=5));
    let amount = if rng.gen_bool(0.5) { size } else { -size };
    NewOrder::new(price, amount)
}

/// Submit one random order every `every`, forever.
pub async fn run(coordinator: Arc<Coordinator>, every: Duration) {
    let mut ticker = tokio::time::interval(every);

    loop {
        ticker.tick().await;

        let order = random_order(&mut rand::thread_rng());
        match coordinator.submit(order.clone()).await {
            Ok(replies) => {
                let fulfilled = replies.iter().filter(|r| r.is_fulfilled).count();
                info!(
                    price = %order.price,
                    amount = %order.amount,
                    replicas = replies.len(),
                    fulfilled,
                    "demo order submitted"
                );
            }
            Err(e) => warn!(error = %e, "demo order failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn random_orders_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let order = random_order(&mut rng);
            assert!(order.price >= dec!(90.00) && order.price <= dec!(110.00));
            assert_eq!(order.price.scale(), 2);

            let size = order.amount.abs();
            assert!(size >= dec!(1) && size <= dec!(5));
            assert_eq!(size.fract(), Decimal::ZERO);
        }
    }
}
