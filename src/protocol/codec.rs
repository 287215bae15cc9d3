//! Frame codec
//!
//! Encoding and decoding functions for the wire framing.
//!
//! ## Wire Format
//! ```text
//! ┌──────────────────┬─────────────────────────────────────┐
//! │  Length (4, BE)  │          Payload (Length)           │
//! └──────────────────┴─────────────────────────────────────┘
//! ```
//!
//! A coalesced write is simply several frames back to back in one buffer.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, TransportError};

/// Header size: 4 bytes big-endian payload length
pub const HEADER_SIZE: usize = 4;

/// Default maximum payload size (16 KiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024;

// =============================================================================
// Header Encoding/Decoding
// =============================================================================

/// Encode a payload length as a frame header
pub fn encode_header(len: u32) -> [u8; HEADER_SIZE] {
    len.to_be_bytes()
}

/// Decode a frame header into the announced payload length
pub fn decode_header(header: [u8; HEADER_SIZE]) -> u32 {
    u32::from_be_bytes(header)
}

// =============================================================================
// Frame Encoding
// =============================================================================

/// Encode a single frame to bytes
///
/// Format: payload_len (4) + payload
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    put_frame(&mut buf, payload);
    buf.freeze()
}

/// Append every payload as a frame to `buf`, in order
///
/// `buf` is not cleared first, so callers can reuse a scratch buffer.
pub fn encode_batch<P: AsRef<[u8]>>(buf: &mut BytesMut, payloads: &[P]) {
    let total: usize = payloads
        .iter()
        .map(|p| HEADER_SIZE + p.as_ref().len())
        .sum();
    buf.reserve(total);

    for payload in payloads {
        put_frame(buf, payload.as_ref());
    }
}

fn put_frame(buf: &mut BytesMut, payload: &[u8]) {
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame from a stream
///
/// Blocks until the header and the whole payload have arrived. A header
/// announcing more than `max_size` bytes fails with `FrameTooLarge` before
/// any payload buffer is allocated. A stream closed mid-frame fails with an
/// `UnexpectedEof` I/O error.
pub fn read_frame<R: Read>(reader: &mut R, max_size: usize) -> Result<Bytes> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let size = decode_header(header);

    // Protect against allocation attacks: a hostile peer could announce
    // gigabyte frames in a row
    if size as u64 > max_size as u64 {
        return Err(TransportError::FrameTooLarge {
            size,
            max: max_size,
        });
    }

    // Read payload into a buffer of exactly the announced size
    let mut payload = vec![0u8; size as usize];
    if size > 0 {
        reader.read_exact(&mut payload)?;
    }

    Ok(Bytes::from(payload))
}

/// Write one frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let bytes = encode_frame(payload);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Write every payload as a frame in a single coalesced write
///
/// `scratch` is cleared and refilled; it is owned by the caller so that
/// its allocation can be reused across batches.
pub fn write_batch<W: Write, P: AsRef<[u8]>>(
    writer: &mut W,
    payloads: &[P],
    scratch: &mut BytesMut,
) -> Result<()> {
    scratch.clear();
    encode_batch(scratch, payloads);
    writer.write_all(scratch)?;
    writer.flush()?;
    Ok(())
}
