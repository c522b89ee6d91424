//! TCP implementation of [`PeerNetwork`].
//!
//! Every call looks up the providers of the request's service, opens one
//! connection per provider, writes a single [`RequestFrame`] and reads a
//! single [`ReplyFrame`] back. Announcements go to the discovery service
//! and are refreshed by [`TcpNetwork::spawn_refresher`] before their TTL
//! runs out.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use book_protocol::{Reply, ReplyFrame, Request, RequestFrame, Service};
use futures::future::{select_ok, try_join_all};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::discovery::DiscoveryClient;
use crate::error::NodeError;
use crate::substrate::PeerNetwork;
use crate::wire::{read_frame, write_frame};

pub struct TcpNetwork {
    discovery: DiscoveryClient,
    announce_ttl: Duration,
    announced: Mutex<BTreeSet<(Service, String)>>,
}

impl TcpNetwork {
    pub fn new(discovery: DiscoveryClient, announce_ttl: Duration) -> Self {
        TcpNetwork {
            discovery,
            announce_ttl,
            announced: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        TcpNetwork::new(
            DiscoveryClient::new(config.discovery_addr.clone(), config.rpc_timeout),
            config.announce_ttl,
        )
    }

    /// Re-announce everything we currently serve every `every`, so the
    /// directory keeps us past the TTL. `every` must be non-zero.
    ///
    /// Abort the returned task before withdrawing announcements, or a
    /// tick in flight can put them back.
    pub fn spawn_refresher(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick fires immediately; announce() already registered us.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let current: Vec<(Service, String)> =
                    self.announced.lock().await.iter().cloned().collect();

                for (service, endpoint) in current {
                    if let Err(e) = self
                        .discovery
                        .announce(service.as_str(), &endpoint, self.announce_ttl)
                        .await
                    {
                        warn!(%service, %endpoint, error = %e, "re-announce failed");
                    }
                }
            }
        })
    }

    async fn providers(&self, service: Service) -> Result<Vec<String>, NodeError> {
        let peers = self.lookup(service).await?;
        if peers.is_empty() {
            return Err(NodeError::NoPeers(service.to_string()));
        }
        Ok(peers)
    }

    /// One request/reply exchange with `endpoint`.
    async fn call(
        &self,
        endpoint: &str,
        frame: &RequestFrame,
        timeout: Duration,
    ) -> Result<Reply, NodeError> {
        let exchange = async {
            let mut stream = TcpStream::connect(endpoint).await?;
            stream.set_nodelay(true)?;

            write_frame(&mut stream, frame).await?;
            let reply = read_frame::<_, ReplyFrame>(&mut stream).await?.ok_or_else(|| {
                NodeError::NoReply {
                    endpoint: endpoint.to_string(),
                }
            })?;

            Ok::<_, NodeError>(reply.answering(frame.rid)?)
        };

        let reply = match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result.map_err(|e| e.at(endpoint))?,
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
impl PeerNetwork for TcpNetwork {
    async fn request(&self, request: Request, timeout: Duration) -> Result<Reply, NodeError> {
        let peers = self.providers(request.service()).await?;
        let frame = request.to_frame(Uuid::now_v7())?;
        debug!(rid = %frame.rid, key = %frame.key, candidates = peers.len(), "request");

        let calls = peers
            .iter()
            .map(|peer| Box::pin(self.call(peer, &frame, timeout)));
        let (reply, _) = select_ok(calls).await?;
        Ok(reply)
    }

    async fn fan_out(&self, request: Request, timeout: Duration) -> Result<Vec<Reply>, NodeError> {
        let peers = self.providers(request.service()).await?;
        let frame = request.to_frame(Uuid::now_v7())?;
        debug!(rid = %frame.rid, key = %frame.key, peers = peers.len(), "fan-out");

        try_join_all(peers.iter().map(|peer| self.call(peer, &frame, timeout))).await
    }

    async fn announce(&self, service: Service, endpoint: &str) -> Result<(), NodeError> {
        self.discovery
            .announce(service.as_str(), endpoint, self.announce_ttl)
            .await?;
        self.announced
            .lock()
            .await
            .insert((service, endpoint.to_string()));
        Ok(())
    }

    async fn unannounce(&self, service: Service, endpoint: &str) -> Result<(), NodeError> {
        self.announced
            .lock()
            .await
            .remove(&(service, endpoint.to_string()));
        self.discovery.unannounce(service.as_str(), endpoint).await
    }

    async fn lookup(&self, service: Service) -> Result<Vec<String>, NodeError> {
        self.discovery.lookup(service.as_str()).await
    }
}
