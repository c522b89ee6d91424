//! Frame encoding/decoding.
//!
//! Framing model (one message per frame):
//!
//! ```text
//! [0..4] : payload length (u32 BE, 1..=MAX_FRAME_LEN)
//! [4..]  : payload, one JSON document
//! ```
//!
//! The same framing carries peer RPC ([`RequestFrame`](crate::rpc::RequestFrame) /
//! [`ReplyFrame`](crate::rpc::ReplyFrame)) and discovery traffic. Stream
//! servers read the prefix, validate it with [`frame_len`], then read
//! exactly that many bytes and hand them to [`decode_payload`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::wire_types::{LEN_PREFIX, MAX_FRAME_LEN, PROTOCOL_VERSION};

/// Errors that can arise when encoding/decoding a frame or interpreting
/// its contents.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Buffer too short for the length prefix or the announced payload.
    #[error("frame truncated")]
    Truncated,

    /// Zero-length prefix.
    #[error("empty frame")]
    EmptyFrame,

    /// Length prefix above [`MAX_FRAME_LEN`].
    #[error("frame of {0} bytes exceeds the maximum frame size")]
    FrameTooLarge(usize),

    /// Payload is not valid JSON for the expected message.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Request key does not name a known service.
    #[error("unknown service `{0}`")]
    UnknownService(String),

    /// Unsupported protocol version.
    #[error("protocol version mismatch: got {0}, expected {expected}", expected = PROTOCOL_VERSION)]
    VersionMismatch(u8),

    /// Reply variant does not fit the request that was sent.
    #[error("expected {expected} reply, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: &'static str,
    },

    /// Reply correlation id differs from the request's.
    #[error("reply for request {got} does not answer request {expected}")]
    CorrelationMismatch { expected: Uuid, got: Uuid },
}

/// Serialize `msg` as a JSON payload, enforcing the frame size limit.
pub fn encode_payload<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(msg)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    Ok(payload)
}

/// Append a complete frame (prefix + payload) for `msg` to `out`.
pub fn encode_frame<T: Serialize>(msg: &T, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    let payload = encode_payload(msg)?;
    out.reserve(LEN_PREFIX + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

/// Validate a length prefix and return the payload size it announces.
pub fn frame_len(prefix: [u8; LEN_PREFIX]) -> Result<usize, ProtocolError> {
    let len = u32::from_be_bytes(prefix) as usize;
    if len == 0 {
        return Err(ProtocolError::EmptyFrame);
    }
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    Ok(len)
}

/// Parse a payload (without its prefix).
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Decode the first complete frame in `buf`.
///
/// Returns the message and the number of bytes consumed, or
/// [`ProtocolError::Truncated`] if `buf` does not yet hold a full frame.
pub fn decode_frame<T: DeserializeOwned>(buf: &[u8]) -> Result<(T, usize), ProtocolError> {
    if buf.len() < LEN_PREFIX {
        return Err(ProtocolError::Truncated);
    }
    let prefix = [buf[0], buf[1], buf[2], buf[3]];
    let len = frame_len(prefix)?;

    let end = LEN_PREFIX + len;
    if buf.len() < end {
        return Err(ProtocolError::Truncated);
    }
    let msg = decode_payload(&buf[LEN_PREFIX..end])?;
    Ok((msg, end))
}
