//! Async frame I/O over tokio streams.
//!
//! Thin wrappers around the `book-protocol` codec: read a length prefix,
//! validate it, read exactly that many bytes, decode.

use std::io;

use book_protocol::{decode_payload, encode_frame, frame_len};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::NodeError;

/// Read one frame. `Ok(None)` means the peer closed the stream cleanly
/// before sending another frame.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, NodeError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut prefix = [0u8; 4];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = frame_len(prefix)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Some(decode_payload(&payload)?))
}

/// Write one frame and flush.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<(), NodeError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut buf = Vec::with_capacity(256);
    encode_frame(msg, &mut buf)?;

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_protocol::{ProtocolError, Reply, ReplyFrame};
    use uuid::Uuid;

    #[tokio::test]
    async fn frames_survive_a_duplex_pipe() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let sent = ReplyFrame::new(Uuid::now_v7(), Reply::ack());

        write_frame(&mut client, &sent).await.expect("write");
        drop(client);

        let received: Option<ReplyFrame> = read_frame(&mut server).await.expect("read");
        assert_eq!(received, Some(sent));

        let eof: Option<ReplyFrame> = read_frame(&mut server).await.expect("read eof");
        assert!(eof.is_none());
    }

    #[tokio::test]
    async fn oversized_prefix_is_a_protocol_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&u32::MAX.to_be_bytes()).await.expect("write prefix");

        let result: Result<Option<ReplyFrame>, _> = read_frame(&mut server).await;
        assert!(matches!(
            result,
            Err(NodeError::Protocol(ProtocolError::FrameTooLarge(_)))
        ));
    }
}
