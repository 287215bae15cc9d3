//! Connection Record
//!
//! Per-connection state shared by the Peer and the connection's two
//! worker threads.

use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::Config;
use crate::protocol::ConnectionId;
use crate::queue::{BatchQueue, Signal};

/// State of one established connection
///
/// The Peer's connection table owns the record. The send and receive
/// threads hold clones of the `Arc` but only the receive thread's teardown
/// removes it from the table.
pub(crate) struct ConnectionRecord {
    /// Connection id
    id: ConnectionId,

    /// Socket handle; worker threads use their own clones of it
    stream: TcpStream,

    /// Remote address for logging
    peer_addr: String,

    /// Outbound payloads waiting for the send thread
    send_queue: BatchQueue<Bytes>,

    /// Wakes the send thread when `send_queue` is not empty anymore
    send_pending: Signal,

    /// Set once the workers have been told to exit
    stopping: AtomicBool,

    /// Set once the Disconnected event for this id has been queued
    closed: AtomicBool,

    send_thread: Mutex<Option<JoinHandle<()>>>,
    receive_thread: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionRecord {
    /// Create a new record around an already configured stream
    pub fn new(id: ConnectionId, stream: TcpStream) -> Self {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            id,
            stream,
            peer_addr,
            send_queue: BatchQueue::new(),
            send_pending: Signal::new(),
            stopping: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            send_thread: Mutex::new(None),
            receive_thread: Mutex::new(None),
        }
    }

    /// Apply the per-socket options from the config
    pub fn configure(stream: &TcpStream, config: &Config) -> io::Result<()> {
        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(config.no_delay)?;

        // Bounded writes so a stalled remote cannot park the send thread
        stream.set_write_timeout(config.send_timeout())?;

        // Reads block until a frame arrives or the socket closes
        stream.set_read_timeout(None)?;

        Ok(())
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    // =========================================================================
    // Send Path
    // =========================================================================

    /// Queue a payload and wake the send thread
    ///
    /// Returns false once the connection's Disconnected event is queued.
    /// A payload accepted while the workers are stopping is dropped.
    pub fn enqueue(&self, payload: Bytes) -> bool {
        if self.is_closed() {
            return false;
        }
        self.send_queue.enqueue(payload);
        self.send_pending.set();
        true
    }

    pub fn send_queue(&self) -> &BatchQueue<Bytes> {
        &self.send_queue
    }

    pub fn send_pending(&self) -> &Signal {
        &self.send_pending
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// True while the workers are exiting or gone
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Tell both workers to exit and force blocked I/O to return
    ///
    /// Safe to call from any thread, any number of times. Does not make the
    /// connection look dead to callers; see `mark_closed`.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::Release);

        // Both directions: the receive thread sees EOF, the send thread
        // gets a write error. Fails harmlessly if already shut down.
        let _ = self.stream.shutdown(Shutdown::Both);

        // Wake the send thread so it observes the flag
        self.send_pending.set();
    }

    /// True once the Disconnected event has been queued
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Record that Disconnected was queued; sends are refused from here on
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn set_send_thread(&self, handle: JoinHandle<()>) {
        *self.send_thread.lock() = Some(handle);
    }

    pub fn set_receive_thread(&self, handle: JoinHandle<()>) {
        *self.receive_thread.lock() = Some(handle);
    }

    /// Wait for the send thread to exit
    pub fn join_send_thread(&self) {
        let handle = self.send_thread.lock().take();
        join_quietly(handle, self.id, "send");
    }

    /// Wait for the receive thread to exit
    pub fn join_receive_thread(&self) {
        let handle = self.receive_thread.lock().take();
        join_quietly(handle, self.id, "receive");
    }
}

fn join_quietly(handle: Option<JoinHandle<()>>, id: ConnectionId, role: &str) {
    let Some(handle) = handle else {
        return;
    };

    // A thread cannot join itself
    if handle.thread().id() == thread::current().id() {
        return;
    }

    if handle.join().is_err() {
        tracing::error!("Connection {} {} thread panicked", id, role);
    }
}
