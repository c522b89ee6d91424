//! In-process [`PeerNetwork`].
//!
//! A `LocalNetwork` is a hub shared (by cloning) between several nodes
//! living in the same process. Requests are delivered straight to the
//! target's [`Dispatcher`] as [`RequestFrame`]s, so they go through the
//! same parsing and reply checks as over TCP, only without sockets.
//!
//! Endpoints can be detached to simulate a crashed peer: the announcement
//! stays in the directory, but every call to it fails.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use book_protocol::{Reply, Request, RequestFrame, Service};
use futures::future::{select_ok, try_join_all};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dispatcher::Dispatcher;
use crate::error::NodeError;
use crate::substrate::PeerNetwork;

#[derive(Debug, Clone, Default)]
pub struct LocalNetwork {
    hub: Arc<RwLock<Hub>>,
}

#[derive(Debug, Default)]
struct Hub {
    endpoints: HashMap<String, Dispatcher>,
    services: HashMap<Service, BTreeSet<String>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        LocalNetwork::default()
    }

    /// Make `endpoint` reachable, answering through `dispatcher`.
    pub async fn attach(&self, endpoint: impl Into<String>, dispatcher: Dispatcher) {
        self.hub
            .write()
            .await
            .endpoints
            .insert(endpoint.into(), dispatcher);
    }

    /// Make `endpoint` unreachable without withdrawing its announcements.
    pub async fn detach(&self, endpoint: &str) -> bool {
        self.hub.write().await.endpoints.remove(endpoint).is_some()
    }

    async fn providers(&self, service: Service) -> Result<Vec<String>, NodeError> {
        let peers = self.lookup(service).await?;
        if peers.is_empty() {
            return Err(NodeError::NoPeers(service.to_string()));
        }
        Ok(peers)
    }

    async fn call(
        &self,
        endpoint: &str,
        frame: RequestFrame,
        timeout: Duration,
    ) -> Result<Reply, NodeError> {
        let dispatcher = self.hub.read().await.endpoints.get(endpoint).cloned();
        let dispatcher = dispatcher.ok_or_else(|| NodeError::Transport {
            endpoint: endpoint.to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "endpoint not attached"),
        })?;

        let rid = frame.rid;
        let reply = match tokio::time::timeout(timeout, dispatcher.handle_frame(frame)).await {
            Ok(Some(reply)) => reply.answering(rid)?,
            Ok(None) => {
                return Err(NodeError::NoReply {
                    endpoint: endpoint.to_string(),
                })
            }
            Err(_) => {
                return Err(NodeError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout,
                })
            }
        };

        match reply {
            Reply::Rejected { reason } => Err(NodeError::Rejected {
                endpoint: endpoint.to_string(),
                reason,
            }),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl PeerNetwork for LocalNetwork {
    async fn request(&self, request: Request, timeout: Duration) -> Result<Reply, NodeError> {
        let peers = self.providers(request.service()).await?;
        let frame = request.to_frame(Uuid::now_v7())?;

        let calls = peers
            .iter()
            .map(|peer| Box::pin(self.call(peer, frame.clone(), timeout)));
        let (reply, _) = select_ok(calls).await?;
        Ok(reply)
    }

    async fn fan_out(&self, request: Request, timeout: Duration) -> Result<Vec<Reply>, NodeError> {
        let peers = self.providers(request.service()).await?;
        let frame = request.to_frame(Uuid::now_v7())?;

        try_join_all(
            peers
                .iter()
                .map(|peer| self.call(peer, frame.clone(), timeout)),
        )
        .await
    }

    async fn announce(&self, service: Service, endpoint: &str) -> Result<(), NodeError> {
        self.hub
            .write()
            .await
            .services
            .entry(service)
            .or_default()
            .insert(endpoint.to_string());
        Ok(())
    }

    async fn unannounce(&self, service: Service, endpoint: &str) -> Result<(), NodeError> {
        if let Some(endpoints) = self.hub.write().await.services.get_mut(&service) {
            endpoints.remove(endpoint);
        }
        Ok(())
    }

    async fn lookup(&self, service: Service) -> Result<Vec<String>, NodeError> {
        let hub = self.hub.read().await;
        Ok(hub
            .services
            .get(&service)
            .map(|endpoints| endpoints.iter().cloned().collect())
            .unwrap_or_default())
    }
}
