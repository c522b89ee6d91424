//! book-protocol
//!
//! Wire-level contract between trading nodes and the discovery service.
//!
//! This crate is responsible for turning logical requests
//! ([`Request`], [`DiscoveryRequest`]) into framed bytes and back again.
//!
//! - [`wire_types`] : version, frame limits, capability keys
//! - [`rpc`]        : peer request/reply envelopes
//! - [`discovery`]  : announce / lookup messages
//! - [`codec`]      : length-prefixed JSON framing

pub mod wire_types;
pub mod rpc;
pub mod discovery;
pub mod codec;

pub use wire_types::{Service, MAX_FRAME_LEN, PROTOCOL_VERSION};

pub use rpc::{Ack, NewOrderReply, Reply, ReplyFrame, Request, RequestFrame, SyncReply};

pub use discovery::{DiscoveryReply, DiscoveryRequest};

pub use codec::{
    ProtocolError,
    decode_frame,
    decode_payload,
    encode_frame,
    encode_payload,
    frame_len,
};
