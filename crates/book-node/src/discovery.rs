//! Discovery service: who serves which capability.
//!
//! - [`ServiceDirectory`] is the in-memory table `service -> endpoint ->
//!   expiry`. Announcements live for their TTL unless refreshed.
//! - [`run`] serves the directory over TCP using the same frame codec
//!   as peer RPC.
//! - [`DiscoveryClient`] is what nodes use to announce and look up.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use book_protocol::{DiscoveryReply, DiscoveryRequest};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::NodeError;
use crate::wire::{read_frame, write_frame};

/// Announcement table.
#[derive(Debug, Default)]
pub struct ServiceDirectory {
    services: HashMap<String, HashMap<String, Instant>>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        ServiceDirectory::default()
    }

    /// Register or refresh `endpoint` for `service` until `now + ttl`.
    pub fn announce(&mut self, service: &str, endpoint: &str, ttl: Duration, now: Instant) {
        self.services
            .entry(service.to_string())
            .or_default()
            .insert(endpoint.to_string(), now + ttl);
    }

    /// Remove `endpoint` from `service`. Returns `false` if it was absent.
    pub fn unannounce(&mut self, service: &str, endpoint: &str) -> bool {
        match self.services.get_mut(service) {
            Some(endpoints) => endpoints.remove(endpoint).is_some(),
            None => false,
        }
    }

    /// Live endpoints for `service`, sorted. Expired entries are dropped.
    pub fn lookup(&mut self, service: &str, now: Instant) -> Vec<String> {
        let endpoints = match self.services.get_mut(service) {
            Some(endpoints) => endpoints,
            None => return Vec::new(),
        };

        endpoints.retain(|_, expiry| *expiry > now);

        let mut live: Vec<String> = endpoints.keys().cloned().collect();
        live.sort();
        live
    }

    pub fn handle(&mut self, request: DiscoveryRequest, now: Instant) -> DiscoveryReply {
        match request {
            DiscoveryRequest::Announce {
                service,
                endpoint,
                ttl_ms,
            } => {
                self.announce(&service, &endpoint, Duration::from_millis(ttl_ms), now);
                DiscoveryReply::Ok
            }
            DiscoveryRequest::Unannounce { service, endpoint } => {
                self.unannounce(&service, &endpoint);
                DiscoveryReply::Ok
            }
            DiscoveryRequest::Lookup { service } => DiscoveryReply::Peers {
                endpoints: self.lookup(&service, now),
            },
        }
    }
}

/// Serve a fresh directory on `listener` until accepting fails.
pub async fn run(listener: TcpListener) -> Result<(), NodeError> {
    let directory = Arc::new(Mutex::new(ServiceDirectory::new()));
    info!(addr = ?listener.local_addr().ok(), "discovery service listening");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let directory = directory.clone();

        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, directory).await {
                debug!(%peer_addr, error = %e, "discovery connection ended with error");
            }
        });
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    directory: Arc<Mutex<ServiceDirectory>>,
) -> Result<(), NodeError> {
    while let Some(request) = read_frame::<_, DiscoveryRequest>(&mut stream).await? {
        debug!(?request, "discovery request");
        let reply = directory.lock().await.handle(request, Instant::now());
        write_frame(&mut stream, &reply).await?;
    }
    Ok(())
}

/// Node-side handle on the discovery service.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    addr: String,
    timeout: Duration,
}

impl DiscoveryClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        DiscoveryClient {
            addr: addr.into(),
            timeout,
        }
    }

    pub async fn announce(&self, service: &str, endpoint: &str, ttl: Duration) -> Result<(), NodeError> {
        let reply = self
            .call(DiscoveryRequest::Announce {
                service: service.to_string(),
                endpoint: endpoint.to_string(),
                ttl_ms: ttl.as_millis() as u64,
            })
            .await?;
        expect_ok(reply)
    }

    pub async fn unannounce(&self, service: &str, endpoint: &str) -> Result<(), NodeError> {
        let reply = self
            .call(DiscoveryRequest::Unannounce {
                service: service.to_string(),
                endpoint: endpoint.to_string(),
            })
            .await?;
        expect_ok(reply)
    }

    pub async fn lookup(&self, service: &str) -> Result<Vec<String>, NodeError> {
        let reply = self
            .call(DiscoveryRequest::Lookup {
                service: service.to_string(),
            })
            .await?;

        match reply {
            DiscoveryReply::Peers { endpoints } => Ok(endpoints),
            DiscoveryReply::Error { reason } => Err(NodeError::Discovery(reason)),
            DiscoveryReply::Ok => Err(NodeError::Discovery("lookup answered without peers".to_string())),
        }
    }

    /// One request/reply exchange on a fresh connection.
    async fn call(&self, request: DiscoveryRequest) -> Result<DiscoveryReply, NodeError> {
        let exchange = async {
            let mut stream = TcpStream::connect(&self.addr).await?;
            write_frame(&mut stream, &request).await?;
            let reply = read_frame::<_, DiscoveryReply>(&mut stream).await?;
            reply.ok_or_else(|| NodeError::NoReply {
                endpoint: self.addr.clone(),
            })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result.map_err(|e| e.at(&self.addr)),
            Err(_) => Err(NodeError::Timeout {
                endpoint: self.addr.clone(),
                timeout: self.timeout,
            }),
        }
    }
}

fn expect_ok(reply: DiscoveryReply) -> Result<(), NodeError> {
    match reply {
        DiscoveryReply::Ok => Ok(()),
        DiscoveryReply::Error { reason } => Err(NodeError::Discovery(reason)),
        DiscoveryReply::Peers { .. } => Err(NodeError::Discovery("unexpected peer list".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_sorted_live_endpoints() {
        let mut dir = ServiceDirectory::new();
        let now = Instant::now();
        dir.announce("new-order", "127.0.0.1:2000", Duration::from_secs(5), now);
        dir.announce("new-order", "127.0.0.1:1000", Duration::from_secs(5), now);
        dir.announce("sync", "127.0.0.1:1000", Duration::from_secs(5), now);

        assert_eq!(
            dir.lookup("new-order", now),
            vec!["127.0.0.1:1000".to_string(), "127.0.0.1:2000".to_string()]
        );
        assert!(dir.lookup("lock", now).is_empty());
    }

    #[test]
    fn announcements_expire_unless_refreshed() {
        let mut dir = ServiceDirectory::new();
        let start = Instant::now();
        dir.announce("lock", "a:1", Duration::from_secs(5), start);
        dir.announce("lock", "b:2", Duration::from_secs(5), start);

        let later = start + Duration::from_secs(4);
        dir.announce("lock", "b:2", Duration::from_secs(5), later);

        let after_ttl = start + Duration::from_secs(6);
        assert_eq!(dir.lookup("lock", after_ttl), vec!["b:2".to_string()]);
    }

    #[test]
    fn unannounce_removes_only_that_pair() {
        let mut dir = ServiceDirectory::new();
        let now = Instant::now();
        dir.announce("lock", "a:1", Duration::from_secs(5), now);
        dir.announce("unlock", "a:1", Duration::from_secs(5), now);

        assert!(dir.unannounce("lock", "a:1"));
        assert!(!dir.unannounce("lock", "a:1"));
        assert!(dir.lookup("lock", now).is_empty());
        assert_eq!(dir.lookup("unlock", now), vec!["a:1".to_string()]);
    }

    #[test]
    fn handle_maps_requests_to_replies() {
        let mut dir = ServiceDirectory::new();
        let now = Instant::now();

        let ack = dir.handle(
            DiscoveryRequest::Announce {
                service: "sync".to_string(),
                endpoint: "a:1".to_string(),
                ttl_ms: 1_000,
            },
            now,
        );
        assert_eq!(ack, DiscoveryReply::Ok);

        let peers = dir.handle(
            DiscoveryRequest::Lookup {
                service: "sync".to_string(),
            },
            now,
        );
        assert_eq!(
            peers,
            DiscoveryReply::Peers {
                endpoints: vec!["a:1".to_string()]
            }
        );
    }
}
