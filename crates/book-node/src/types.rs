//! Shared types for the trading node.
//!
//! This module defines:
//! - `NodeState`: the replica (order book + lock registry)
//! - `SharedState`: the single-writer handle every task goes through
//! - `NodePhase`: the join/trading lifecycle

use std::fmt;
use std::sync::Arc;

use book_core::{LockRegistry, OrderBook};
use tokio::sync::Mutex;

/// Everything a node replicates or tracks about its peers.
#[derive(Debug, Default)]
pub struct NodeState {
    pub book: OrderBook,
    pub locks: LockRegistry,
}

impl NodeState {
    pub fn shared() -> SharedState {
        Arc::new(Mutex::new(NodeState::default()))
    }
}

/// Process-wide replica state.
///
/// Request handlers and the node's own submission path both lock this
/// for the whole of their read-modify-write, so the book and the
/// registry only ever see one writer at a time.
pub type SharedState = Arc<Mutex<NodeState>>;

/// Lifecycle of a node.
///
/// `Starting → Locking → Announcing → WaitingDiscoverable → Syncing →
/// Unlocking → Trading → Stopping`. A failure during the join leaves the
/// phase where it happened; the process is expected to exit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodePhase {
    Starting,
    Locking,
    Announcing,
    WaitingDiscoverable,
    Syncing,
    Unlocking,
    Trading,
    Stopping,
}

impl NodePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            NodePhase::Starting => "starting",
            NodePhase::Locking => "locking",
            NodePhase::Announcing => "announcing",
            NodePhase::WaitingDiscoverable => "waiting-discoverable",
            NodePhase::Syncing => "syncing",
            NodePhase::Unlocking => "unlocking",
            NodePhase::Trading => "trading",
            NodePhase::Stopping => "stopping",
        }
    }
}

impl fmt::Display for NodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
