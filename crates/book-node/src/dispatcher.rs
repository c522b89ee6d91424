//! Inbound request handling.
//!
//! The dispatcher owns a handle to the node's [`SharedState`] and turns
//! each inbound [`RequestFrame`] into at most one [`ReplyFrame`]:
//!
//! - `lock` / `unlock`: update the lock registry, reply with an ack.
//! - `sync`: reply with a snapshot of the book.
//! - `new-order`: place the order under the frame's correlation id,
//!   reply with the placement result and the resting count.
//! - unknown key: log and send nothing back.
//!
//! Every handler runs with the state mutex held for its whole body, so
//! concurrent connections never interleave inside the book or registry.

use book_core::OrderId;
use book_protocol::{NewOrderReply, ProtocolError, Reply, ReplyFrame, Request, RequestFrame, SyncReply};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::SharedState;

#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: SharedState,
}

impl Dispatcher {
    pub fn new(state: SharedState) -> Self {
        Dispatcher { state }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Decode and handle one request envelope.
    ///
    /// Returns `None` for unrecognized keys: those are dropped without a
    /// reply.
    pub async fn handle_frame(&self, frame: RequestFrame) -> Option<ReplyFrame> {
        let rid = frame.rid;

        match Request::from_frame(&frame) {
            Ok(request) => Some(ReplyFrame::new(rid, self.handle(rid, request).await)),
            Err(ProtocolError::UnknownService(key)) => {
                warn!(%rid, %key, "ignoring request for unrecognized service");
                None
            }
            Err(err) => {
                warn!(%rid, key = %frame.key, error = %err, "rejecting malformed request");
                Some(ReplyFrame::new(
                    rid,
                    Reply::Rejected {
                        reason: err.to_string(),
                    },
                ))
            }
        }
    }

    /// Apply a parsed request to the replica.
    pub async fn handle(&self, rid: Uuid, request: Request) -> Reply {
        let mut state = self.state.lock().await;

        match request {
            Request::Lock(client) => {
                let newly = state.locks.lock(client.clone());
                debug!(%client, newly, holders = state.locks.len(), "client locked");
                Reply::ack()
            }
            Request::Unlock(client) => {
                let held = state.locks.unlock(&client);
                debug!(%client, held, holders = state.locks.len(), "client unlocked");
                Reply::ack()
            }
            Request::Sync => {
                let book = state.book.snapshot();
                debug!(orders = book.len(), "serving book snapshot");
                Reply::Book(SyncReply { book })
            }
            Request::NewOrder(new) => {
                let order = new.with_id(OrderId::from(rid));
                let outcome = state.book.execute(order);
                let nb_orders = state.book.len();
                let top = state.book.top_of_book();

                for fill in &outcome.fills {
                    debug!(order = %rid, maker = %fill.maker, price = %fill.price, quantity = %fill.quantity, "fill");
                }
                info!(
                    order = %rid,
                    price = %new.price,
                    amount = %new.amount,
                    fulfilled = outcome.is_fulfilled(),
                    remaining = %outcome.remaining,
                    resting = nb_orders,
                    best_bid = ?top.best_bid,
                    best_ask = ?top.best_ask,
                    "order placed"
                );

                Reply::Placed(NewOrderReply {
                    success: true,
                    is_fulfilled: outcome.is_fulfilled(),
                    nb_orders,
                })
            }
        }
    }
}
