//! Error types for the trading node.
//!
//! The variants follow how the coordinator reacts to them:
//! - [`NodeError::NoPeers`] is the bootstrap signal (discovery knows no
//!   provider), which join treats as success.
//! - transport failures ([`Timeout`](NodeError::Timeout),
//!   [`Transport`](NodeError::Transport), [`NoReply`](NodeError::NoReply),
//!   [`Rejected`](NodeError::Rejected), [`Discovery`](NodeError::Discovery))
//!   abort a join step or a single submission.
//! - [`NotDiscoverable`](NodeError::NotDiscoverable) ends startup.

use std::io;
use std::time::Duration;

use book_protocol::ProtocolError;
use thiserror::Error;

use crate::types::NodePhase;

#[derive(Debug, Error)]
pub enum NodeError {
    /// Discovery returned no provider for the service.
    #[error("no peers provide `{0}`")]
    NoPeers(String),

    /// A peer call exceeded its time budget.
    #[error("request to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    /// Connecting, reading or writing failed.
    #[error("transport error with {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The peer closed the connection without answering.
    #[error("{endpoint} closed the connection without replying")]
    NoReply { endpoint: String },

    /// The peer understood the key but refused the payload.
    #[error("{endpoint} rejected the request: {reason}")]
    Rejected { endpoint: String, reason: String },

    /// The discovery service answered with an error or nonsense.
    #[error("discovery error: {0}")]
    Discovery(String),

    /// Our own announcement never showed up in lookups.
    #[error("node not discoverable after {attempts} lookups")]
    NotDiscoverable { attempts: u32 },

    /// The pre-submission wait hit its configured limit.
    #[error("submission lock still held after {0:?}")]
    LockWaitExceeded(Duration),

    /// Submissions are only accepted once the join has completed.
    #[error("node is {0}, not trading")]
    NotTrading(NodePhase),

    /// The peer RPC listener ended; peers can no longer reach us.
    #[error("peer listener stopped: {0}")]
    ListenerStopped(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl NodeError {
    /// True for the legitimate "nobody else is here yet" outcome.
    pub fn is_bootstrap_empty(&self) -> bool {
        matches!(self, NodeError::NoPeers(_))
    }

    /// Attach the remote endpoint to a bare I/O error.
    pub(crate) fn at(self, endpoint: &str) -> Self {
        match self {
            NodeError::Io(source) => NodeError::Transport {
                endpoint: endpoint.to_string(),
                source,
            },
            other => other,
        }
    }
}
