//! TCP Listener
//!
//! Accepts connections on a dedicated thread and hands them to admission.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::Result;

use super::peer::Shared;

/// Listening socket plus the thread running its accept loop
pub(crate) struct Listener {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Listener {
    /// Bind on `port` and start the accept thread
    ///
    /// Binding happens on the calling thread so that the bound address
    /// (including an ephemeral port) is known on return.
    pub fn bind(shared: Arc<Shared>, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((shared.config().listen_ip, port))?;

        // Non-blocking accept so the loop can observe the stop flag
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("framelink-accept".to_string())
            .spawn(move || accept_loop(shared, listener, thread_stop))?;

        Ok(Self {
            local_addr,
            stop,
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// True while the accept thread is alive
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Signal the accept loop to exit and wait for it
    ///
    /// The listening socket is released when the accept thread returns.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Accept thread on {} panicked", self.local_addr);
            }
        }
    }
}

fn accept_loop(shared: Arc<Shared>, listener: TcpListener, stop: Arc<AtomicBool>) {
    let local_addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let poll_interval = shared.config().accept_poll_interval();

    tracing::info!("Listening on {}", local_addr);

    while !stop.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, addr)) => {
                // Accepted sockets may inherit non-blocking mode on some platforms
                if let Err(e) = stream.set_nonblocking(false) {
                    tracing::warn!("Dropping connection from {}: {}", addr, e);
                    continue;
                }
                if let Err(e) = shared.admit(stream) {
                    tracing::warn!("Failed to admit connection from {}: {}", addr, e);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(poll_interval);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::ConnectionReset
                ) =>
            {
                // The remote gave up before we accepted; keep going
                tracing::debug!("Accept on {} interrupted: {}", local_addr, e);
            }
            Err(e) => {
                tracing::error!("Accept on {} failed, listener stopping: {}", local_addr, e);
                break;
            }
        }
    }

    tracing::info!("Listener on {} stopped", local_addr);
}
