//! Protocol Module
//!
//! Defines the wire framing and the events handed to consumers.
//!
//! ## Frame Format
//! ```text
//! ┌──────────────────┬─────────────────────────────────────┐
//! │  Length (4, BE)  │          Payload (Length)           │
//! └──────────────────┴─────────────────────────────────────┘
//! ```
//!
//! - No magic number, version byte or checksum; integrity relies on TCP
//! - Length is bounded by the configured maximum message size on both ends
//! - Payloads are opaque to the transport

mod message;
mod codec;

pub use message::{ConnectionId, EventType, Message, FAILED_CONNECT_ID};
pub use codec::{
    HEADER_SIZE, DEFAULT_MAX_MESSAGE_SIZE,
    encode_header, decode_header,
    encode_frame, encode_batch,
    read_frame, write_frame, write_batch,
};
