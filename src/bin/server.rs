//! framelink Echo Server Binary
//!
//! Listens for connections and echoes every frame back to its sender.

use std::thread;
use std::time::Duration;

use clap::Parser;
use framelink::{Config, EventType, Peer};
use tracing_subscriber::{fmt, EnvFilter};

/// framelink echo server
#[derive(Parser, Debug)]
#[command(name = "framelink-server")]
#[command(about = "Length-prefixed TCP echo server")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7777")]
    port: u16,

    /// Maximum message size in bytes
    #[arg(long, default_value = "16384")]
    max_message_size: usize,

    /// Connection count at which a notice is logged
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Idle sleep between polls of the event queue, in milliseconds
    #[arg(long, default_value = "1")]
    poll_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,framelink=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("framelink server v{}", framelink::VERSION);

    let config = Config::builder()
        .listen_port(args.port)
        .max_message_size(args.max_message_size)
        .max_connections(args.max_connections)
        .build();

    let peer = match Peer::new(config) {
        Ok(peer) => peer,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if !peer.listen() {
        tracing::error!("Could not listen on port {}", args.port);
        std::process::exit(1);
    }

    let idle = Duration::from_millis(args.poll_ms);
    loop {
        let Some(message) = peer.get_next_message() else {
            thread::sleep(idle);
            continue;
        };

        match message.event_type {
            EventType::Connected => {
                tracing::info!("Client {} connected", message.connection_id);
            }
            EventType::Data => {
                let payload = message.data.unwrap_or_default();
                tracing::debug!(
                    "Client {} sent {} bytes",
                    message.connection_id,
                    payload.len()
                );
                peer.send(message.connection_id, payload);
            }
            EventType::Disconnected => {
                tracing::info!("Client {} disconnected", message.connection_id);
            }
        }
    }
}
