//! Peer messaging substrate.
//!
//! The coordinator only needs four things from the network: ask one
//! provider of a capability, ask all of them, advertise a capability,
//! and list who advertises it. [`PeerNetwork`] is that seam; the TCP
//! stack ([`crate::tcp`]) and the in-process hub ([`crate::local`]) both
//! implement it.

use std::time::Duration;

use async_trait::async_trait;
use book_protocol::{Reply, Request, Service};

use crate::error::NodeError;

#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Send `request` to the providers of its service and return the
    /// first successful reply.
    ///
    /// Fails with [`NodeError::NoPeers`] when discovery knows no
    /// provider, or with the last peer error when every provider failed.
    async fn request(&self, request: Request, timeout: Duration) -> Result<Reply, NodeError>;

    /// Send `request` to every provider of its service, all under the
    /// same correlation id, and collect every reply.
    ///
    /// Fails with [`NodeError::NoPeers`] when there is no provider, and
    /// with the first peer error otherwise.
    async fn fan_out(&self, request: Request, timeout: Duration) -> Result<Vec<Reply>, NodeError>;

    /// Advertise `endpoint` as a provider of `service`.
    async fn announce(&self, service: Service, endpoint: &str) -> Result<(), NodeError>;

    /// Withdraw a previous announcement.
    async fn unannounce(&self, service: Service, endpoint: &str) -> Result<(), NodeError>;

    /// Endpoints currently providing `service` (possibly empty).
    async fn lookup(&self, service: Service) -> Result<Vec<String>, NodeError>;
}
