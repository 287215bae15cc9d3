//! Connection Workers
//!
//! The two blocking loops every connection runs on its own threads, plus
//! the short-lived outbound connect routine.
//!
//! ## Receive loop
//! ```text
//!   Reading-Header ──▶ Reading-Body ──▶ (emit Data) ──┐
//!         ▲                                           │
//!         └───────────────────────────────────────────┘
//!   any failure ──▶ Closed (teardown: close, Disconnected, remove)
//! ```
//!
//! ## Send loop
//! reset signal → drain queue → one coalesced write → wait on signal

use std::io::{self, BufReader};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;

use crate::error::TransportError;
use crate::protocol::{read_frame, write_batch, Message, FAILED_CONNECT_ID};

use super::connection::ConnectionRecord;
use super::peer::Shared;

/// Initial capacity of a send thread's scratch buffer
const SCRATCH_INITIAL_CAPACITY: usize = 4 * 1024;

/// A scratch buffer grown beyond this is released after the write
const SCRATCH_RETAIN_LIMIT: usize = 256 * 1024;

// =============================================================================
// Receive Loop
// =============================================================================

/// Read frames until the connection fails, then tear it down
///
/// This thread is the single point where a connection is considered gone:
/// it emits the one `Disconnected` event for the id and removes the record.
pub(crate) fn receive_loop(shared: Arc<Shared>, record: Arc<ConnectionRecord>, stream: TcpStream) {
    let id = record.id();
    let max_size = shared.config().max_message_size;
    let mut reader = BufReader::new(stream);

    let reason = loop {
        match read_frame(&mut reader, max_size) {
            Ok(payload) => {
                tracing::trace!("Connection {}: received {} bytes", id, payload.len());
                shared.inbound().push(Message::data(id, payload));
            }
            Err(e) => break e,
        }
    };

    match reason {
        TransportError::FrameTooLarge { size, max } => {
            // Protocol violation: never retried, never fatal to the Peer
            tracing::warn!(
                "Connection {} ({}): possible allocation attack with a header of {} bytes (max {})",
                id,
                record.peer_addr(),
                size,
                max
            );
        }
        ref e if record.is_stopping() => {
            tracing::debug!("Connection {} closed locally: {}", id, e);
        }
        ref e if e.is_disconnect() => {
            tracing::debug!("Connection {} ({}) disconnected", id, record.peer_addr());
        }
        e => {
            tracing::info!(
                "Connection {} ({}): receive loop finished: {}",
                id,
                record.peer_addr(),
                e
            );
        }
    }

    shared.teardown(&record);
}

// =============================================================================
// Send Loop
// =============================================================================

/// Write queued payloads as coalesced batches until the connection closes
///
/// On a write failure the socket is shut down; the receive loop then sees
/// the closed stream and performs the teardown.
pub(crate) fn send_loop(record: Arc<ConnectionRecord>, mut stream: TcpStream) {
    let id = record.id();
    let mut scratch = BytesMut::with_capacity(SCRATCH_INITIAL_CAPACITY);

    loop {
        // Reset before draining: a send that lands after this point is
        // either part of this drain or sets the signal again for the next
        // iteration, never lost.
        record.send_pending().reset();

        if let Some(batch) = record.send_queue().try_dequeue_all() {
            if let Err(e) = write_batch(&mut stream, &batch, &mut scratch) {
                if record.is_stopping() || e.is_disconnect() {
                    tracing::debug!("Connection {}: send stopped: {}", id, e);
                } else {
                    // Remote ends go away all the time, not an error
                    tracing::info!("Connection {}: write failed: {}", id, e);
                }
                break;
            }
            tracing::trace!("Connection {}: wrote {} frames", id, batch.len());

            if scratch.capacity() > SCRATCH_RETAIN_LIMIT {
                scratch = BytesMut::with_capacity(SCRATCH_INITIAL_CAPACITY);
            }
        }

        if record.is_stopping() {
            break;
        }

        // Block until the queue is not empty anymore (or we are stopping)
        record.send_pending().wait();
    }

    // Makes the receive loop observe the failure if it has not already
    record.shutdown();
}

// =============================================================================
// Outbound Connect
// =============================================================================

/// Blocking connect followed by admission
///
/// A failed attempt is reported as a `Disconnected` event with connection
/// id 0 so the caller learns about it without blocking.
pub(crate) fn connect_and_admit(shared: Arc<Shared>, address: String, port: u16) {
    tracing::info!("Connecting to {}:{}", address, port);

    let stream = match connect_blocking(&address, port, shared.config().connect_timeout()) {
        Ok(stream) => stream,
        Err(e) => {
            // Typically nothing is listening on that address/port
            tracing::info!("Failed to connect to {}:{}: {}", address, port, e);
            shared.inbound().push(Message::disconnected(FAILED_CONNECT_ID));
            return;
        }
    };

    match shared.admit(stream) {
        Ok(id) => tracing::info!("Connection {} established to {}:{}", id, address, port),
        Err(TransportError::PeerDropped) => {
            // Nobody is left to drain events; the socket is closed on drop
            tracing::debug!("Peer dropped before {}:{} could be admitted", address, port);
        }
        Err(e) => {
            tracing::info!("Failed to admit connection to {}:{}: {}", address, port, e);
            shared.inbound().push(Message::disconnected(FAILED_CONNECT_ID));
        }
    }
}

fn connect_blocking(address: &str, port: u16, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let Some(timeout) = timeout else {
        return TcpStream::connect((address, port));
    };

    // connect_timeout takes a single address, so try each resolved one
    let mut last_err = None;
    for addr in (address, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{}:{} did not resolve to any address", address, port),
        )
    }))
}
