//! TCP listener for inbound peer RPC.
//!
//! This module:
//! - Accepts peer connections on an already bound listener.
//! - Refuses connections beyond `max_connections`.
//! - Spawns one task per connection running [`connection::serve_peer`],
//!   which answers frames through the shared [`Dispatcher`].

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connection;
use crate::dispatcher::Dispatcher;
use crate::error::NodeError;

/// Serve peer requests on `listener` until accepting fails.
pub async fn run(
    listener: TcpListener,
    dispatcher: Dispatcher,
    max_connections: usize,
) -> Result<(), NodeError> {
    info!(addr = ?listener.local_addr().ok(), max_connections, "peer RPC listening");

    let active = Arc::new(AtomicUsize::new(0));

    loop {
        let (stream, peer_addr) = listener.accept().await?;

        if active.load(Ordering::Relaxed) >= max_connections {
            warn!(%peer_addr, max_connections, "rejecting connection: limit reached");
            // Dropping the stream closes it; the caller sees a reset.
            continue;
        }
        active.fetch_add(1, Ordering::Relaxed);

        let dispatcher = dispatcher.clone();
        let active = active.clone();

        tokio::spawn(async move {
            match connection::serve_peer(stream, dispatcher).await {
                Ok(served) => debug!(%peer_addr, served, "peer disconnected"),
                Err(e) => debug!(%peer_addr, error = %e, "peer connection error"),
            }
            active.fetch_sub(1, Ordering::Relaxed);
        });
    }
}

/// Wait for `shutdown` or for the listener task to end, whichever is
/// first.
///
/// `Ok(())` means a clean shutdown request. The listener never ends on
/// its own, so its completion is always an error.
pub async fn until_shutdown<F>(
    listener: &mut JoinHandle<Result<(), NodeError>>,
    shutdown: F,
) -> Result<(), NodeError>
where
    F: Future<Output = io::Result<()>>,
{
    tokio::select! {
        signal = shutdown => {
            signal?;
            Ok(())
        }
        ended = listener => match ended {
            Ok(Ok(())) => Err(NodeError::ListenerStopped("exited".to_string())),
            Ok(Err(e)) => Err(NodeError::ListenerStopped(e.to_string())),
            Err(join) => Err(NodeError::ListenerStopped(join.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;
    use std::time::Duration;

    #[tokio::test]
    async fn failed_listener_ends_the_wait_with_an_error() {
        let mut listener = tokio::spawn(async {
            Err::<(), _>(NodeError::Io(io::Error::new(
                io::ErrorKind::Other,
                "too many open files",
            )))
        });

        let result = until_shutdown(&mut listener, pending()).await;
        match result {
            Err(NodeError::ListenerStopped(reason)) => assert!(reason.contains("too many open files")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_signal_wins_over_a_running_listener() {
        let mut listener = tokio::spawn(async {
            pending::<()>().await;
            Ok(())
        });

        let result = until_shutdown(&mut listener, async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        })
        .await;

        assert!(result.is_ok());
        assert!(!listener.is_finished());
        listener.abort();
    }
}
