//! Peer
//!
//! The orchestrator: owns the connection table, the shared inbound queue
//! and the optional listener, and exposes the non-blocking control surface.
//!
//! ## Concurrency Model: thread-per-connection
//!
//! - One accept thread per listening Peer
//! - One short-lived thread per outbound `connect`
//! - Two long-lived threads per connection (receive, send)
//!
//! Nothing a consumer calls (`start`, `connect`, `send`,
//! `get_next_message`) blocks on network I/O.

use std::collections::HashMap;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{Result, TransportError};
use crate::protocol::{ConnectionId, Message, FAILED_CONNECT_ID};

use super::connection::ConnectionRecord;
use super::inbound::InboundQueue;
use super::listener::Listener;
use super::worker;

/// Callback fired with the id of a connection that was admitted or torn down
pub type ConnectionHook = Arc<dyn Fn(ConnectionId) + Send + Sync>;

// =============================================================================
// Shared State
// =============================================================================

/// State reachable from every thread of a Peer
pub(crate) struct Shared {
    config: Config,

    /// Live connections by id
    connections: RwLock<HashMap<ConnectionId, Arc<ConnectionRecord>>>,

    /// Events waiting for the consumer
    inbound: InboundQueue,

    /// Last issued connection id
    last_connection_id: AtomicU64,

    /// Set when the owning Peer is dropped; admission is refused from then on
    dropped: AtomicBool,

    on_connection: RwLock<Vec<ConnectionHook>>,
    on_disconnection: RwLock<Vec<ConnectionHook>>,
}

impl Shared {
    fn new(config: Config) -> Self {
        let inbound = InboundQueue::new(
            config.queue_warning_threshold,
            config.queue_warning_interval(),
        );

        Self {
            config,
            connections: RwLock::new(HashMap::new()),
            inbound,
            last_connection_id: AtomicU64::new(FAILED_CONNECT_ID),
            dropped: AtomicBool::new(false),
            on_connection: RwLock::new(Vec::new()),
            on_disconnection: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn inbound(&self) -> &InboundQueue {
        &self.inbound
    }

    fn next_connection_id(&self) -> ConnectionId {
        self.last_connection_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn connection(&self, id: ConnectionId) -> Option<Arc<ConnectionRecord>> {
        self.connections.read().get(&id).cloned()
    }

    /// Register a freshly accepted or connected socket and start its threads
    ///
    /// An `Err` means nothing was emitted for this socket. Once `Connected`
    /// has been queued, every later failure is reported through the event
    /// stream instead.
    pub fn admit(self: &Arc<Self>, stream: TcpStream) -> Result<ConnectionId> {
        // Step 1: socket options and worker handles
        ConnectionRecord::configure(&stream, &self.config)?;
        let reader = stream.try_clone()?;
        let writer = stream.try_clone()?;

        // Step 2: id and registration
        let id = self.next_connection_id();
        let record = Arc::new(ConnectionRecord::new(id, stream));
        let live = {
            let mut connections = self.connections.write();
            // Checked under the table lock: Drop sets the flag before it
            // collects the table, so no admission slips past it
            if self.dropped.load(Ordering::Acquire) {
                return Err(TransportError::PeerDropped);
            }
            connections.insert(id, Arc::clone(&record));
            connections.len()
        };
        if live == self.config.max_connections {
            // Advisory only: the connection is still admitted
            tracing::info!("Max connection count reached: {}", live);
        }

        // Step 3: send thread
        let send_record = Arc::clone(&record);
        let spawned = thread::Builder::new()
            .name(format!("framelink-send-{}", id))
            .spawn(move || worker::send_loop(send_record, writer));
        match spawned {
            Ok(handle) => record.set_send_thread(handle),
            Err(e) => {
                record.shutdown();
                self.connections.write().remove(&id);
                return Err(e.into());
            }
        }

        // Step 4: notify. Queued before the receive thread exists, so
        // Connected always precedes this id's Data and Disconnected.
        self.inbound.push(Message::connected(id));
        self.fire(&self.on_connection, id);

        // Step 5: receive thread
        let receive_shared = Arc::clone(self);
        let receive_record = Arc::clone(&record);
        let spawned = thread::Builder::new()
            .name(format!("framelink-recv-{}", id))
            .spawn(move || worker::receive_loop(receive_shared, receive_record, reader));
        match spawned {
            Ok(handle) => record.set_receive_thread(handle),
            Err(e) => {
                tracing::error!("Connection {}: failed to spawn receive thread: {}", id, e);
                self.teardown(&record);
                return Ok(id);
            }
        }

        tracing::debug!("Connection {} admitted from {}", id, record.peer_addr());
        Ok(id)
    }

    /// Canonical teardown of a connection
    ///
    /// Shut the socket down, emit Disconnected, and only then refuse sends
    /// and remove from the table, so no caller sees the id vanish before
    /// being told why.
    pub fn teardown(&self, record: &ConnectionRecord) {
        let id = record.id();

        record.shutdown();
        record.join_send_thread();

        self.inbound.push(Message::disconnected(id));
        record.mark_closed();
        self.fire(&self.on_disconnection, id);

        if self.connections.write().remove(&id).is_none() {
            tracing::error!("There is no connection for id {}", id);
        }
    }

    fn fire(&self, hooks: &RwLock<Vec<ConnectionHook>>, id: ConnectionId) {
        // Clone out so a hook may register further hooks
        let hooks: Vec<ConnectionHook> = hooks.read().clone();
        for hook in hooks {
            hook(id);
        }
    }
}

// =============================================================================
// Peer
// =============================================================================

/// A TCP endpoint that can accept and open connections
///
/// All methods take `&self`; a Peer can be shared across threads behind an
/// `Arc`.
pub struct Peer {
    shared: Arc<Shared>,
    listener: Mutex<Option<Listener>>,
}

impl Peer {
    /// Create a new Peer with the given config
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared::new(config)),
            listener: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        self.shared.config()
    }

    // =========================================================================
    // Listener Lifecycle
    // =========================================================================

    /// Start accepting connections on `port`
    ///
    /// Returns false if already started or if binding failed.
    pub fn start(&self, port: u16) -> bool {
        match self.try_start(port) {
            Ok(_) => true,
            Err(TransportError::AlreadyStarted) => {
                tracing::error!("Peer already started on {:?}", self.local_addr());
                false
            }
            Err(e) => {
                tracing::error!("Failed to start listening on port {}: {}", port, e);
                false
            }
        }
    }

    /// Start accepting connections on the configured `listen_port`
    pub fn listen(&self) -> bool {
        self.start(self.config().listen_port)
    }

    /// Start accepting connections on `port`, returning the bound address
    pub fn try_start(&self, port: u16) -> Result<SocketAddr> {
        let mut slot = self.listener.lock();

        if let Some(listener) = slot.as_ref() {
            if listener.is_running() {
                return Err(TransportError::AlreadyStarted);
            }
        }
        // A listener whose thread died is reclaimed before binding again
        if let Some(dead) = slot.take() {
            dead.stop();
        }

        let listener = Listener::bind(Arc::clone(&self.shared), port)?;
        let addr = listener.local_addr();
        *slot = Some(listener);
        Ok(addr)
    }

    /// Stop accepting connections
    ///
    /// No-op if not started. Established connections keep running until
    /// their sockets close or they are dropped with `disconnect`.
    pub fn stop(&self) {
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.stop();
        }
    }

    /// True while the accept thread is running
    pub fn is_started(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .map_or(false, Listener::is_running)
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().as_ref().map(Listener::local_addr)
    }

    // =========================================================================
    // Outbound Connections
    // =========================================================================

    /// Begin an asynchronous outbound connection attempt
    ///
    /// The outcome arrives through `get_next_message`: `Connected` with the
    /// new id, or `Disconnected` with id 0 on failure.
    pub fn connect(&self, address: &str, port: u16) {
        let shared = Arc::clone(&self.shared);
        let address = address.to_string();

        let spawned = thread::Builder::new()
            .name("framelink-connect".to_string())
            .spawn(move || worker::connect_and_admit(shared, address, port));

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn connect thread: {}", e);
            self.shared
                .inbound()
                .push(Message::disconnected(FAILED_CONNECT_ID));
        }
    }

    // =========================================================================
    // Messaging
    // =========================================================================

    /// Queue `payload` for a connection
    ///
    /// Returns false if the payload exceeds the maximum message size or the
    /// connection is not live. Never blocks on socket I/O.
    pub fn send(&self, connection_id: ConnectionId, payload: impl Into<Bytes>) -> bool {
        match self.try_send(connection_id, payload) {
            Ok(()) => true,
            Err(e @ TransportError::PayloadTooLarge { .. }) => {
                tracing::error!("Connection {}: {}", connection_id, e);
                false
            }
            Err(e) => {
                // Common right after a disconnect, keep it quiet
                tracing::debug!("Connection {}: send rejected: {}", connection_id, e);
                false
            }
        }
    }

    /// Queue `payload` for a connection, reporting why it was rejected
    pub fn try_send(&self, connection_id: ConnectionId, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();
        let max = self.max_message_size();
        if payload.len() > max {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }

        let record = self
            .shared
            .connection(connection_id)
            .ok_or(TransportError::UnknownConnection(connection_id))?;

        // Add to the send queue and return immediately; writing here could
        // block for a long time if the remote lags
        if record.enqueue(payload) {
            Ok(())
        } else {
            Err(TransportError::UnknownConnection(connection_id))
        }
    }

    /// Remove and return the oldest inbound event, if any
    pub fn get_next_message(&self) -> Option<Message> {
        self.shared.inbound().pop()
    }

    /// Drop a connection
    ///
    /// The connection's receive thread performs the teardown and emits its
    /// `Disconnected` event. Returns false for an unknown id.
    pub fn disconnect(&self, connection_id: ConnectionId) -> bool {
        match self.shared.connection(connection_id) {
            Some(record) => {
                record.shutdown();
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// True until the connection's Disconnected event has been queued
    pub fn is_connected(&self, connection_id: ConnectionId) -> bool {
        self.shared
            .connection(connection_id)
            .map_or(false, |record| !record.is_closed())
    }

    /// Number of connections in the table
    pub fn connection_count(&self) -> usize {
        self.shared.connections.read().len()
    }

    /// Number of events waiting in the inbound queue
    pub fn receive_queue_len(&self) -> usize {
        self.shared.inbound().len()
    }

    pub fn max_message_size(&self) -> usize {
        self.config().max_message_size
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Register a callback fired when a connection is admitted
    ///
    /// Runs on the accepting or connecting thread.
    pub fn on_connection<F>(&self, hook: F)
    where
        F: Fn(ConnectionId) + Send + Sync + 'static,
    {
        self.shared.on_connection.write().push(Arc::new(hook));
    }

    /// Register a callback fired when a connection is torn down
    ///
    /// Runs on the connection's receive thread.
    pub fn on_disconnection<F>(&self, hook: F)
    where
        F: Fn(ConnectionId) + Send + Sync + 'static,
    {
        self.shared.on_disconnection.write().push(Arc::new(hook));
    }
}

impl Default for Peer {
    fn default() -> Self {
        Self {
            shared: Arc::new(Shared::new(Config::default())),
            listener: Mutex::new(None),
        }
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.shared.dropped.store(true, Ordering::Release);
        self.stop();

        let records: Vec<Arc<ConnectionRecord>> =
            self.shared.connections.read().values().cloned().collect();
        for record in &records {
            record.shutdown();
        }
        for record in &records {
            record.join_receive_thread();
        }
    }
}
