//! Submission lock bookkeeping.
//!
//! A joining node broadcasts "lock" with its client id to every peer,
//! and "unlock" once it has copied a book snapshot. Each peer records
//! the ids here and holds back its own submissions while any id is
//! present.
//!
//! This is a best-effort, non-linearizable lock: there is no lease and
//! no expiry. A joining node that dies between lock and unlock leaves
//! its id behind in every peer's registry until the process restarts.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Address-derived identifier of a node (`host:port`).
///
/// Stable for the lifetime of the process; also the endpoint the node
/// announces for its services.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        ClientId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SocketAddr> for ClientId {
    fn from(addr: SocketAddr) -> Self {
        ClientId(addr.to_string())
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        ClientId(id.to_string())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of client ids currently claiming the submission lock.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    locked: HashSet<ClientId>,
}

impl LockRegistry {
    pub fn new() -> Self {
        LockRegistry::default()
    }

    /// Record `client` as joining. Returns `false` if it was already locked.
    pub fn lock(&mut self, client: ClientId) -> bool {
        self.locked.insert(client)
    }

    /// Forget `client`. Returns `false` if it was not locked.
    pub fn unlock(&mut self, client: &ClientId) -> bool {
        self.locked.remove(client)
    }

    /// True while any client holds the lock.
    pub fn is_locked(&self) -> bool {
        !self.locked.is_empty()
    }

    pub fn contains(&self, client: &ClientId) -> bool {
        self.locked.contains(client)
    }

    /// Number of clients currently holding the lock.
    pub fn len(&self) -> usize {
        self.locked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }
}
