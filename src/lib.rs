//! # framelink
//!
//! A low-level, bidirectional message transport over TCP with:
//! - Length-prefixed binary framing (4-byte big-endian header)
//! - Thread-per-connection blocking I/O (one receive + one send thread)
//! - Batched, coalesced outbound writes
//! - A non-blocking, polled inbound event queue
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Consumer                             │
//! │        send(id, payload)          get_next_message()         │
//! └───────────┬──────────────────────────────────▲──────────────┘
//!             │                                  │
//! ┌───────────▼──────────────────────────────────┴──────────────┐
//! │                           Peer                               │
//! │   connection table (RwLock)      inbound queue (SegQueue)    │
//! └───────────┬──────────────────────────────────▲──────────────┘
//!             │                                  │
//!      ┌──────┴───────┐                   ┌──────┴───────┐
//!      ▼              ▼                   │              │
//! ┌──────────┐  ┌──────────┐        ┌──────────┐  ┌──────────┐
//! │BatchQueue│  │  Signal  │        │ Receive  │  │  Accept  │
//! │ (per id) │  │ (per id) │        │  thread  │  │  thread  │
//! └────┬─────┘  └────┬─────┘        └────▲─────┘  └──────────┘
//!      └──────┬──────┘                   │
//!             ▼                          │
//!      ┌─────────────┐            ┌──────┴──────┐
//!      │ Send thread │──frames──▶ │  TcpStream  │
//!      └─────────────┘            └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod queue;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{TransportError, Result};
pub use config::Config;
pub use network::{ConnectionId, Peer};
pub use protocol::{EventType, Message};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of framelink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
