//! Inbound event definitions
//!
//! Represents what a consumer drains from `Peer::get_next_message`.

use bytes::Bytes;

/// Identifies one live connection within a Peer
///
/// Assigned from 1 upwards and never reused. `0` is reserved for the
/// synthetic event reporting a failed outbound connect.
pub type ConnectionId = u64;

/// Connection id carried by the event of a failed `Peer::connect`
pub const FAILED_CONNECT_ID: ConnectionId = 0;

/// Kind of inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A connection was admitted
    Connected,

    /// A complete frame arrived
    Data,

    /// The connection is gone (or an outbound connect failed)
    Disconnected,
}

/// One inbound event for a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Connection the event belongs to
    pub connection_id: ConnectionId,

    /// What happened
    pub event_type: EventType,

    /// Frame payload, present only for `EventType::Data`
    pub data: Option<Bytes>,
}

impl Message {
    /// Create a Connected event
    pub fn connected(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            event_type: EventType::Connected,
            data: None,
        }
    }

    /// Create a Data event
    pub fn data(connection_id: ConnectionId, data: Bytes) -> Self {
        Self {
            connection_id,
            event_type: EventType::Data,
            data: Some(data),
        }
    }

    /// Create a Disconnected event
    pub fn disconnected(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            event_type: EventType::Disconnected,
            data: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.event_type == EventType::Connected
    }

    pub fn is_data(&self) -> bool {
        self.event_type == EventType::Data
    }

    pub fn is_disconnected(&self) -> bool {
        self.event_type == EventType::Disconnected
    }

    /// Payload bytes, empty for non-Data events
    pub fn payload(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}
