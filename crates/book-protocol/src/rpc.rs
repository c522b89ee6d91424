//! Peer RPC envelopes and typed requests/replies.
//!
//! A request travels as a [`RequestFrame`]: protocol version, the
//! correlation id (`rid`), the capability key and a JSON payload whose
//! shape depends on the key:
//!
//! | key         | payload                       | reply                                   |
//! |-------------|-------------------------------|-----------------------------------------|
//! | `lock`      | client id (string)            | `{"kind":"ack","success":true}`         |
//! | `unlock`    | client id (string)            | `{"kind":"ack","success":true}`         |
//! | `sync`      | `null`                        | `{"kind":"book","book":[...]}`          |
//! | `new-order` | `{"price":..,"amount":..}`    | `{"kind":"placed","success":..,"isFulfilled":..,"nbOrders":..}` |
//!
//! Inside the process the key/payload pair is parsed into the
//! [`Request`] enum so handlers match exhaustively on variants instead of
//! strings.

use book_core::{ClientId, NewOrder, Order};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::codec::ProtocolError;
use crate::wire_types::{Service, PROTOCOL_VERSION};

/// A parsed peer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// A joining node asks us to hold back submissions.
    Lock(ClientId),

    /// The joining node has its snapshot; release its lock.
    Unlock(ClientId),

    /// Send back the full resting book.
    Sync,

    /// Match and rest an order; its id comes from the frame's `rid`.
    NewOrder(NewOrder),
}

impl Request {
    /// Capability key this request is addressed to.
    pub fn service(&self) -> Service {
        match self {
            Request::Lock(_) => Service::Lock,
            Request::Unlock(_) => Service::Unlock,
            Request::Sync => Service::Sync,
            Request::NewOrder(_) => Service::NewOrder,
        }
    }

    fn payload(&self) -> Result<Value, ProtocolError> {
        Ok(match self {
            Request::Lock(client) | Request::Unlock(client) => serde_json::to_value(client)?,
            Request::Sync => Value::Null,
            Request::NewOrder(order) => serde_json::to_value(order)?,
        })
    }

    /// Wrap the request in an envelope under correlation id `rid`.
    pub fn to_frame(&self, rid: Uuid) -> Result<RequestFrame, ProtocolError> {
        Ok(RequestFrame {
            version: PROTOCOL_VERSION,
            rid,
            key: self.service().as_str().to_string(),
            payload: self.payload()?,
        })
    }

    /// Parse an envelope back into a typed request.
    ///
    /// Unknown keys yield [`ProtocolError::UnknownService`] so the caller
    /// can tell them apart from malformed payloads for known keys.
    pub fn from_frame(frame: &RequestFrame) -> Result<Self, ProtocolError> {
        if frame.version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch(frame.version));
        }

        let service: Service = frame
            .key
            .parse()
            .map_err(|_| ProtocolError::UnknownService(frame.key.clone()))?;

        let payload = frame.payload.clone();
        Ok(match service {
            Service::Lock => Request::Lock(serde_json::from_value(payload)?),
            Service::Unlock => Request::Unlock(serde_json::from_value(payload)?),
            Service::Sync => Request::Sync,
            Service::NewOrder => Request::NewOrder(serde_json::from_value(payload)?),
        })
    }
}

/// Request envelope as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub version: u8,

    /// Correlation id, shared by every copy of a fanned-out request.
    pub rid: Uuid,

    /// Capability key (see [`Service`]).
    pub key: String,

    #[serde(default)]
    pub payload: Value,
}

/// Reply envelope as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFrame {
    /// Correlation id of the request being answered.
    pub rid: Uuid,

    pub reply: Reply,
}

impl ReplyFrame {
    pub fn new(rid: Uuid, reply: Reply) -> Self {
        ReplyFrame { rid, reply }
    }

    /// Unwrap the reply, checking it answers request `rid`.
    pub fn answering(self, rid: Uuid) -> Result<Reply, ProtocolError> {
        if self.rid != rid {
            return Err(ProtocolError::CorrelationMismatch {
                expected: rid,
                got: self.rid,
            });
        }
        Ok(self.reply)
    }
}

/// Typed reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Reply {
    /// Answer to `lock` / `unlock`.
    Ack(Ack),

    /// Answer to `sync`.
    Book(SyncReply),

    /// Answer to `new-order`.
    Placed(NewOrderReply),

    /// The key was known but the payload could not be parsed.
    Rejected { reason: String },
}

impl Reply {
    pub fn ack() -> Self {
        Reply::Ack(Ack { success: true })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Ack(_) => "ack",
            Reply::Book(_) => "book",
            Reply::Placed(_) => "placed",
            Reply::Rejected { .. } => "rejected",
        }
    }

    pub fn into_ack(self) -> Result<Ack, ProtocolError> {
        match self {
            Reply::Ack(ack) => Ok(ack),
            other => Err(unexpected("ack", &other)),
        }
    }

    pub fn into_book(self) -> Result<Vec<Order>, ProtocolError> {
        match self {
            Reply::Book(sync) => Ok(sync.book),
            other => Err(unexpected("book", &other)),
        }
    }

    pub fn into_placed(self) -> Result<NewOrderReply, ProtocolError> {
        match self {
            Reply::Placed(placed) => Ok(placed),
            other => Err(unexpected("placed", &other)),
        }
    }
}

fn unexpected(expected: &'static str, got: &Reply) -> ProtocolError {
    ProtocolError::UnexpectedReply {
        expected,
        got: got.kind(),
    }
}

/// `{success: true}` answer to lock/unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

/// Full book snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReply {
    pub book: Vec<Order>,
}

/// Result of placing an order on one replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderReply {
    pub success: bool,

    /// Anything matched on this replica.
    pub is_fulfilled: bool,

    /// Resting orders on this replica after placement.
    pub nb_orders: usize,
}
