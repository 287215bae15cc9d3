//! framelink CLI Client
//!
//! Connects to a framelink peer, sends each argument as one frame and
//! prints whatever comes back.

use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use framelink::{Config, ConnectionId, EventType, Peer};
use tracing_subscriber::{fmt, EnvFilter};

/// framelink CLI
#[derive(Parser, Debug)]
#[command(name = "framelink-cli")]
#[command(about = "Send length-prefixed frames to a framelink peer")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1")]
    server: String,

    /// Server port
    #[arg(short, long, default_value = "7777")]
    port: u16,

    /// How long to wait for the connection and the replies, in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Messages to send, one frame each
    #[arg(required = true)]
    messages: Vec<String>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = Config::builder()
        .connect_timeout_ms(args.timeout_ms)
        .build();

    let peer = match Peer::new(config) {
        Ok(peer) => peer,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let deadline = Instant::now() + Duration::from_millis(args.timeout_ms);
    peer.connect(&args.server, args.port);

    let Some(id) = wait_connected(&peer, deadline) else {
        eprintln!("error: could not connect to {}:{}", args.server, args.port);
        return ExitCode::FAILURE;
    };

    for message in &args.messages {
        if !peer.send(id, message.clone().into_bytes()) {
            eprintln!("error: could not send {:?}", message);
            return ExitCode::FAILURE;
        }
    }

    let mut pending = args.messages.len();
    while pending > 0 && Instant::now() < deadline {
        let Some(event) = peer.get_next_message() else {
            thread::sleep(Duration::from_millis(1));
            continue;
        };
        match event.event_type {
            EventType::Data => {
                println!("{}", String::from_utf8_lossy(event.payload()));
                pending -= 1;
            }
            EventType::Disconnected => {
                eprintln!("error: connection closed by remote");
                return ExitCode::FAILURE;
            }
            EventType::Connected => {}
        }
    }

    peer.disconnect(id);

    if pending > 0 {
        eprintln!("error: {} replies missing", pending);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Poll until the outbound connection is admitted or fails
fn wait_connected(peer: &Peer, deadline: Instant) -> Option<ConnectionId> {
    while Instant::now() < deadline {
        match peer.get_next_message() {
            Some(event) if event.event_type == EventType::Connected => {
                return Some(event.connection_id)
            }
            Some(event) if event.event_type == EventType::Disconnected => return None,
            _ => thread::sleep(Duration::from_millis(1)),
        }
    }
    None
}
