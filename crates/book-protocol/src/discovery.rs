//! Discovery service messages.
//!
//! Nodes announce `(service, endpoint)` pairs with a time-to-live and look
//! up the endpoints currently serving a service. Service names are plain
//! strings here; the directory does not interpret them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DiscoveryRequest {
    /// Register (or refresh) `endpoint` as a provider of `service`.
    Announce {
        service: String,
        endpoint: String,
        ttl_ms: u64,
    },

    /// Drop `endpoint` from the providers of `service`.
    Unannounce { service: String, endpoint: String },

    /// List the live providers of `service`.
    Lookup { service: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscoveryReply {
    Ok,
    Peers { endpoints: Vec<String> },
    Error { reason: String },
}
