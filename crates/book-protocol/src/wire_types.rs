//! Low-level wire constants and capability keys.
//!
//! This module defines:
//! - Protocol versioning and the frame size limit.
//! - [`Service`]: the capability keys a node serves and discovers.
//!
//! The encode/decode logic lives in `codec`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Current protocol version, stamped on every request frame.
pub const PROTOCOL_VERSION: u8 = 1;

/// Largest accepted frame payload in bytes.
///
/// Sync replies carry the whole book, so this is generous; anything
/// larger is treated as a corrupt length prefix.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Size of the big-endian length prefix in front of every frame.
pub const LEN_PREFIX: usize = 4;

/// Capability keys served by a node.
///
/// On the wire these are the kebab-case strings `lock`, `unlock`,
/// `sync` and `new-order`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Service {
    /// Claim the submission lock while joining.
    Lock,

    /// Release the submission lock.
    Unlock,

    /// Fetch a full book snapshot.
    Sync,

    /// Submit an order to every replica.
    NewOrder,
}

impl Service {
    pub const ALL: [Service; 4] = [Service::Lock, Service::Unlock, Service::Sync, Service::NewOrder];

    pub fn as_str(self) -> &'static str {
        match self {
            Service::Lock => "lock",
            Service::Unlock => "unlock",
            Service::Sync => "sync",
            Service::NewOrder => "new-order",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a key does not name a known [`Service`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownService(pub String);

impl FromStr for Service {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lock" => Ok(Service::Lock),
            "unlock" => Ok(Service::Unlock),
            "sync" => Ok(Service::Sync),
            "new-order" => Ok(Service::NewOrder),
            other => Err(UnknownService(other.to_string())),
        }
    }
}
