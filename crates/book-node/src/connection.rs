//! Per-connection request loop.

use book_protocol::RequestFrame;
use tokio::net::TcpStream;
use tracing::trace;

use crate::dispatcher::Dispatcher;
use crate::error::NodeError;
use crate::wire::{read_frame, write_frame};

/// Answer frames on `stream` until the peer closes it.
///
/// Returns the number of requests handled. Requests for unknown keys get
/// no reply; the connection stays open for the next frame.
pub async fn serve_peer(mut stream: TcpStream, dispatcher: Dispatcher) -> Result<usize, NodeError> {
    stream.set_nodelay(true)?;
    let mut served = 0;

    while let Some(frame) = read_frame::<_, RequestFrame>(&mut stream).await? {
        trace!(rid = %frame.rid, key = %frame.key, "inbound request");
        served += 1;

        if let Some(reply) = dispatcher.handle_frame(frame).await {
            write_frame(&mut stream, &reply).await?;
        }
    }

    Ok(served)
}
