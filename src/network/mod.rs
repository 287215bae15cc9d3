//! Network Module
//!
//! TCP peer, connection records and worker threads.
//!
//! ## Architecture
//! - Single acceptor thread per listening Peer
//! - One receive thread and one send thread per connection
//! - Receive threads feed a shared inbound queue
//! - `send` feeds a per-connection batch queue

mod connection;
mod inbound;
mod listener;
mod peer;
mod worker;

pub use peer::{ConnectionHook, Peer};
pub use crate::protocol::ConnectionId;
