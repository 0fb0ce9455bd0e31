//! Frame transport: reading and writing whole frames over async byte streams.
//!
//! Frames are length-prefixed by the header's `payload_length`, so a frame is
//! read as exactly `HEADER_SIZE + payload_length` bytes. A peer closing the
//! connection *between* frames is a clean end of stream (`Ok(None)`); closing
//! mid-frame is an error, because the remainder of the stream can no longer
//! be framed.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::codec::{decode_header, encode_header};
use crate::protocol::messages::{FrameHeader, HEADER_SIZE};

/// Errors raised while moving frames over a stream.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket-level failure, including a peer vanishing mid-frame.
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The header declares a payload larger than this endpoint will buffer.
    ///
    /// Carries the raw resource/operation bits so the caller can echo them in
    /// an error reply before closing. Recovery is impossible: consuming the
    /// declared bytes is refused, so the stream is no longer framed.
    #[error(
        "declared payload of {declared} bytes exceeds receive capacity of {max} \
         (resource {resource:#04x}, operation {operation:#03x})"
    )]
    PayloadTooLarge {
        resource: u8,
        operation: u8,
        declared: u32,
        max: usize,
    },
}

/// Reads one whole frame.
///
/// Returns `Ok(None)` when the peer closed cleanly at a frame boundary. A
/// partial header or payload followed by EOF surfaces as an
/// [`std::io::ErrorKind::UnexpectedEof`] i/o error.
pub async fn read_frame<R>(
    reader: &mut R,
    max_payload: usize,
) -> Result<Option<(FrameHeader, Vec<u8>)>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut header_buf = [0u8; HEADER_SIZE];

    // First read is done by hand so a zero-byte result at the frame boundary
    // can be told apart from EOF inside a frame.
    let first = reader.read(&mut header_buf).await?;
    if first == 0 {
        return Ok(None);
    }
    if first < HEADER_SIZE {
        reader.read_exact(&mut header_buf[first..]).await?;
    }

    let header = decode_header(&header_buf);
    let declared = header.payload_length as usize;
    if declared > max_payload {
        return Err(TransportError::PayloadTooLarge {
            resource: header.resource,
            operation: header.operation,
            declared: header.payload_length,
            max: max_payload,
        });
    }

    let mut payload = vec![0u8; declared];
    reader.read_exact(&mut payload).await?;
    Ok(Some((header, payload)))
}

/// Writes one whole frame.
///
/// The header's `payload_length` is overwritten with `payload.len()` before
/// encoding, so header and payload can never disagree on the wire.
pub async fn write_frame<W>(
    writer: &mut W,
    header: &FrameHeader,
    payload: &[u8],
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let mut header = *header;
    header.payload_length = payload.len() as u32;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&encode_header(&header));
    buf.extend_from_slice(payload);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
