//! book-core
//!
//! Pure replica logic for a peer-to-peer trading node:
//! - order representation (signed amounts, derived side)
//! - single-instrument order book with price-time priority matching
//! - registry of peers currently holding the join lock
//!
//! Nothing here does I/O; the node crate owns networking and wraps these
//! types in its shared state.

pub mod side;
pub mod messages;
pub mod order;
pub mod order_book;
pub mod lock_registry;
pub mod top_of_book;

pub use side::Side;

pub use messages::{Fill, MatchOutcome, NewOrder};

pub use order::{Order, OrderId};
pub use order_book::OrderBook;
pub use lock_registry::{ClientId, LockRegistry};
pub use top_of_book::TopOfBook;
