//! Join sequence and steady-state order submission.
//!
//! A node joining a running network must end up with the same book as
//! everyone else without missing an order placed while it copies the
//! book. The join therefore runs:
//!
//! 1. **lock**: ask every `lock` provider to hold back submissions on
//!    our behalf. Nobody to ask means we are the first node.
//! 2. **announce** `new-order`, `lock` and `unlock`, so orders placed
//!    from now on reach us too.
//! 3. **wait** until discovery actually lists us for `new-order`.
//! 4. **sync** the book from any one `sync` provider.
//! 5. **unlock** everywhere (ourselves included).
//! 6. **announce** `sync`; the node is now trading.
//!
//! Steady-state [`Coordinator::submit`] waits while the local lock
//! registry holds any client, then fans the order out to every
//! `new-order` provider under one correlation id.

use std::sync::Arc;
use std::time::Duration;

use book_core::{ClientId, NewOrder};
use book_protocol::{NewOrderReply, Request, Service};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::NodeError;
use crate::substrate::PeerNetwork;
use crate::types::{NodePhase, SharedState};

/// Timing knobs of the join and submission paths.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub rpc_timeout: Duration,
    pub order_timeout: Duration,
    pub discovery_attempts: u32,
    pub discovery_interval: Duration,
    pub lock_poll: Duration,
    pub lock_wait_limit: Option<Duration>,
}

impl From<&Config> for CoordinatorSettings {
    fn from(config: &Config) -> Self {
        CoordinatorSettings {
            rpc_timeout: config.rpc_timeout,
            order_timeout: config.order_timeout,
            discovery_attempts: config.discovery_attempts,
            discovery_interval: config.discovery_interval,
            lock_poll: config.lock_poll,
            lock_wait_limit: config.lock_wait_limit,
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        CoordinatorSettings::from(&Config::default())
    }
}

pub struct Coordinator {
    network: Arc<dyn PeerNetwork>,
    state: SharedState,
    client_id: ClientId,
    settings: CoordinatorSettings,
    phase: watch::Sender<NodePhase>,
}

impl Coordinator {
    /// `client_id` doubles as the endpoint this node announces.
    pub fn new(
        network: Arc<dyn PeerNetwork>,
        state: SharedState,
        client_id: ClientId,
        settings: CoordinatorSettings,
    ) -> Self {
        let (phase, _) = watch::channel(NodePhase::Starting);
        Coordinator {
            network,
            state,
            client_id,
            settings,
            phase,
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn endpoint(&self) -> &str {
        self.client_id.as_str()
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn phase(&self) -> NodePhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<NodePhase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: NodePhase) {
        info!(client = %self.client_id, %phase, "phase change");
        self.phase.send_replace(phase);
    }

    /// Run the join sequence. On error the phase stays where it failed.
    pub async fn join(&self) -> Result<(), NodeError> {
        self.enter(NodePhase::Locking);
        let locked = self.broadcast(Request::Lock(self.client_id.clone())).await?;
        info!(peers = locked, "peers are holding back submissions");

        self.enter(NodePhase::Announcing);
        for service in [Service::NewOrder, Service::Lock, Service::Unlock] {
            self.network.announce(service, self.endpoint()).await?;
        }

        self.enter(NodePhase::WaitingDiscoverable);
        self.wait_until_discoverable().await?;

        self.enter(NodePhase::Syncing);
        self.synchronize().await?;

        self.enter(NodePhase::Unlocking);
        let unlocked = self
            .broadcast(Request::Unlock(self.client_id.clone()))
            .await?;
        debug!(peers = unlocked, "lock released");

        self.network.announce(Service::Sync, self.endpoint()).await?;
        self.enter(NodePhase::Trading);
        Ok(())
    }

    /// Fan out a lock/unlock. No provider at all counts as success.
    async fn broadcast(&self, request: Request) -> Result<usize, NodeError> {
        let service = request.service();

        match self.network.fan_out(request, self.settings.rpc_timeout).await {
            Ok(replies) => {
                let mut acked = 0;
                for reply in replies {
                    if reply.into_ack()?.success {
                        acked += 1;
                    }
                }
                Ok(acked)
            }
            Err(e) if e.is_bootstrap_empty() => {
                info!(%service, "no providers yet, first node in the network");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    async fn wait_until_discoverable(&self) -> Result<(), NodeError> {
        let attempts = self.settings.discovery_attempts;

        for attempt in 1..=attempts {
            match self.network.lookup(Service::NewOrder).await {
                Ok(peers) if peers.iter().any(|p| p == self.endpoint()) => {
                    debug!(attempt, peers = peers.len(), "discoverable");
                    return Ok(());
                }
                Ok(peers) => debug!(attempt, peers = peers.len(), "not listed yet"),
                Err(e) => debug!(attempt, error = %e, "lookup failed"),
            }

            if attempt < attempts {
                sleep(self.settings.discovery_interval).await;
            }
        }

        Err(NodeError::NotDiscoverable { attempts })
    }

    async fn synchronize(&self) -> Result<(), NodeError> {
        match self
            .network
            .request(Request::Sync, self.settings.rpc_timeout)
            .await
        {
            Ok(reply) => {
                let book = reply.into_book()?;
                let orders = book.len();
                self.state.lock().await.book.init(book);
                info!(orders, "book synchronized");
                Ok(())
            }
            Err(e) if e.is_bootstrap_empty() => {
                info!("nobody serves sync, starting from an empty book");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Submit an order to every replica, ourselves included.
    ///
    /// Waits first while any client holds a lock on this node. The first
    /// failing replica fails the submission; replicas that already
    /// applied the order keep it.
    pub async fn submit(&self, order: NewOrder) -> Result<Vec<NewOrderReply>, NodeError> {
        let phase = self.phase();
        if phase != NodePhase::Trading {
            return Err(NodeError::NotTrading(phase));
        }

        self.wait_for_unlock().await?;

        let replies = self
            .network
            .fan_out(Request::NewOrder(order), self.settings.order_timeout)
            .await?;

        replies
            .into_iter()
            .map(|reply| reply.into_placed().map_err(NodeError::from))
            .collect()
    }

    async fn wait_for_unlock(&self) -> Result<(), NodeError> {
        let started = Instant::now();

        loop {
            let holders = {
                let state = self.state.lock().await;
                if !state.locks.is_locked() {
                    return Ok(());
                }
                state.locks.len()
            };

            if let Some(limit) = self.settings.lock_wait_limit {
                if started.elapsed() >= limit {
                    return Err(NodeError::LockWaitExceeded(limit));
                }
            }

            debug!(holders, "peers joining, holding back submission");
            sleep(self.settings.lock_poll).await;
        }
    }

    /// Withdraw every announcement. Failures are logged, not returned.
    pub async fn stop(&self) {
        self.enter(NodePhase::Stopping);

        for service in Service::ALL {
            if let Err(e) = self.network.unannounce(service, self.endpoint()).await {
                warn!(%service, error = %e, "unannounce failed");
            }
        }
    }
}
