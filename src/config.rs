//! Configuration for framelink
//!
//! Centralized configuration with sensible defaults.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::error::{Result, TransportError};
use crate::protocol::DEFAULT_MAX_MESSAGE_SIZE;

/// Main configuration for a Peer
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Listener Configuration
    // -------------------------------------------------------------------------
    /// Local address the listener binds to
    pub listen_ip: IpAddr,

    /// TCP port used by `Peer::listen`
    pub listen_port: u16,

    /// How long the accept loop sleeps when no connection is pending
    /// (milliseconds). Also bounds how long `Peer::stop` waits.
    pub accept_poll_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Framing Configuration
    // -------------------------------------------------------------------------
    /// Largest payload accepted on send and on receive (in bytes)
    pub max_message_size: usize,

    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Connection count at which a notice is logged. Never enforced.
    pub max_connections: usize,

    /// Disable Nagle's algorithm on every connection
    pub no_delay: bool,

    /// Socket write timeout (milliseconds, 0 = block forever)
    pub send_timeout_ms: u64,

    /// Outbound connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Inbound Queue Configuration
    // -------------------------------------------------------------------------
    /// Inbound queue depth above which a warning is logged
    pub queue_warning_threshold: usize,

    /// Minimum time between two queue depth warnings (milliseconds)
    pub queue_warning_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: 7777,
            accept_poll_interval_ms: 10,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE, // 16 KiB
            max_connections: 5,
            no_delay: true,
            send_timeout_ms: 1000,
            connect_timeout_ms: 0,
            queue_warning_threshold: 100_000,
            queue_warning_interval_ms: 10_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the values can be used by a Peer
    pub fn validate(&self) -> Result<()> {
        if self.max_message_size == 0 {
            return Err(TransportError::Config(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        if self.max_message_size as u64 > u32::MAX as u64 {
            return Err(TransportError::Config(format!(
                "max_message_size {} does not fit a 4-byte length header",
                self.max_message_size
            )));
        }
        if self.accept_poll_interval_ms == 0 {
            return Err(TransportError::Config(
                "accept_poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Write timeout applied to every connection, if any
    pub fn send_timeout(&self) -> Option<Duration> {
        (self.send_timeout_ms > 0).then(|| Duration::from_millis(self.send_timeout_ms))
    }

    /// Timeout for outbound connects, if any
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    pub fn accept_poll_interval(&self) -> Duration {
        Duration::from_millis(self.accept_poll_interval_ms)
    }

    pub fn queue_warning_interval(&self) -> Duration {
        Duration::from_millis(self.queue_warning_interval_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the local address the listener binds to
    pub fn listen_ip(mut self, ip: impl Into<IpAddr>) -> Self {
        self.config.listen_ip = ip.into();
        self
    }

    /// Set the port used by `Peer::listen`
    pub fn listen_port(mut self, port: u16) -> Self {
        self.config.listen_port = port;
        self
    }

    /// Set the accept loop poll interval (in milliseconds)
    pub fn accept_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_interval_ms = ms;
        self
    }

    /// Set the maximum message size (in bytes)
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Set the advisory maximum number of connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn no_delay(mut self, enabled: bool) -> Self {
        self.config.no_delay = enabled;
        self
    }

    /// Set the send timeout (in milliseconds)
    pub fn send_timeout_ms(mut self, ms: u64) -> Self {
        self.config.send_timeout_ms = ms;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the inbound queue depth that triggers a warning
    pub fn queue_warning_threshold(mut self, depth: usize) -> Self {
        self.config.queue_warning_threshold = depth;
        self
    }

    /// Set the minimum interval between queue depth warnings (in milliseconds)
    pub fn queue_warning_interval_ms(mut self, ms: u64) -> Self {
        self.config.queue_warning_interval_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
