//! Shared helpers for network tests
#![allow(dead_code)]

use std::net::{Ipv4Addr, TcpListener};
use std::thread;
use std::time::{Duration, Instant};

use framelink::{Config, ConnectionId, EventType, Message, Peer};

/// Upper bound for anything that should happen "soon"
pub const WAIT: Duration = Duration::from_secs(5);

/// How long to watch for events that must NOT arrive
pub const QUIET: Duration = Duration::from_millis(200);

pub fn test_config() -> Config {
    Config::builder()
        .listen_ip(Ipv4Addr::LOCALHOST)
        .accept_poll_interval_ms(2)
        .build()
}

pub fn new_peer() -> Peer {
    Peer::new(test_config()).unwrap()
}

/// Peer listening on an ephemeral loopback port
pub fn listening_peer() -> (Peer, u16) {
    let peer = new_peer();
    let addr = peer.try_start(0).unwrap();
    (peer, addr.port())
}

/// A port nothing is listening on
pub fn unused_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    listener.local_addr().unwrap().port()
}

/// Poll until an event arrives or the timeout elapses
pub fn next_event(peer: &Peer, timeout: Duration) -> Option<Message> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(message) = peer.get_next_message() {
            return Some(message);
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

/// Next event, which must be of the given type
pub fn expect_event(peer: &Peer, event_type: EventType) -> Message {
    let message = next_event(peer, WAIT)
        .unwrap_or_else(|| panic!("Timed out waiting for {:?}", event_type));
    assert_eq!(message.event_type, event_type, "unexpected event {:?}", message);
    message
}

/// Assert that no event arrives for a short while
pub fn expect_quiet(peer: &Peer) {
    if let Some(message) = next_event(peer, QUIET) {
        panic!("Unexpected event {:?}", message);
    }
}

/// Poll a condition until it holds or the timeout elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Listening server and a client connected to it
pub struct Pair {
    pub server: Peer,
    pub client: Peer,
    pub server_id: ConnectionId,
    pub client_id: ConnectionId,
}

pub fn connected_pair() -> Pair {
    let (server, port) = listening_peer();
    let client = new_peer();

    client.connect("127.0.0.1", port);
    let client_id = expect_event(&client, EventType::Connected).connection_id;
    let server_id = expect_event(&server, EventType::Connected).connection_id;

    Pair {
        server,
        client,
        server_id,
        client_id,
    }
}
