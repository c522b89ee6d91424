//! book-node
//!
//! A peer in a replicated order-book network. Every node keeps a full
//! copy of the book, serves the `lock`, `unlock`, `sync` and `new-order`
//! capabilities to its peers, and replicates its own submissions by
//! sending them to every `new-order` provider.

pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod local;
pub mod server;
pub mod substrate;
pub mod tcp;
pub mod trader;
pub mod types;

// internal modules, not re-exported
mod connection;
mod wire;
