//! Error types for framelink
//!
//! Provides a unified error type for all transport operations.

use thiserror::Error;

use crate::protocol::ConnectionId;

/// Result type alias using TransportError
pub type Result<T> = std::result::Result<T, TransportError>;

/// Unified error type for framelink operations
#[derive(Debug, Error)]
pub enum TransportError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// A remote header announced a frame larger than the configured limit
    #[error("Frame too large: header announced {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: usize },

    /// A local caller tried to send a payload larger than the configured limit
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    // -------------------------------------------------------------------------
    // Peer Errors
    // -------------------------------------------------------------------------
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    #[error("Peer already started")]
    AlreadyStarted,

    #[error("Peer not started")]
    NotStarted,

    /// The owning Peer was dropped while a connection was being admitted
    #[error("Peer dropped")]
    PeerDropped,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransportError {
    /// True for I/O errors that mean the remote end went away
    ///
    /// These are steady-state events for a transport and are logged at
    /// informational level rather than as failures.
    pub fn is_disconnect(&self) -> bool {
        match self {
            TransportError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}
