//! Trading node binary.

use std::sync::Arc;

use anyhow::Context;
use book_core::ClientId;
use book_node::config::Config;
use book_node::coordinator::{Coordinator, CoordinatorSettings};
use book_node::dispatcher::Dispatcher;
use book_node::tcp::TcpNetwork;
use book_node::types::NodeState;
use book_node::{server, trader};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("reading node configuration")?;

    let listener = TcpListener::bind(config.socket_addr_string())
        .await
        .with_context(|| format!("binding {}", config.socket_addr_string()))?;
    let port = listener.local_addr()?.port();
    let client_id = ClientId::new(format!("{}:{}", config.advertise_host, port));

    info!(
        %client_id,
        discovery = %config.discovery_addr,
        "starting book-node"
    );

    let state = NodeState::shared();
    let mut server_task = tokio::spawn(server::run(
        listener,
        Dispatcher::new(state.clone()),
        config.max_connections,
    ));

    let network = Arc::new(TcpNetwork::from_config(&config));
    let refresher = network.clone().spawn_refresher(config.announce_interval);

    let coordinator = Arc::new(Coordinator::new(
        network,
        state,
        client_id,
        CoordinatorSettings::from(&config),
    ));

    if let Err(e) = coordinator.join().await {
        error!(phase = %coordinator.phase(), error = %e, "join failed");
        refresher.abort();
        let _ = refresher.await;
        coordinator.stop().await;
        server_task.abort();
        return Err(e).context("joining the network");
    }

    let demo = config
        .demo_interval
        .map(|every| tokio::spawn(trader::run(coordinator.clone(), every)));

    let outcome = server::until_shutdown(&mut server_task, tokio::signal::ctrl_c()).await;
    match &outcome {
        Ok(()) => info!("shutting down"),
        Err(e) => error!(error = %e, "peer listener failed, shutting down"),
    }

    if let Some(demo) = demo {
        demo.abort();
    }
    // Stop re-announcing before withdrawing, so nothing is put back.
    refresher.abort();
    let _ = refresher.await;
    coordinator.stop().await;
    server_task.abort();

    outcome.context("serving peers")
}
