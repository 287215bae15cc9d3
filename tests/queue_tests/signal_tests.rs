//! Signal Tests
//!
//! Tests verify manual-reset semantics: a set survives until reset and
//! wakes a blocked waiter.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use framelink::queue::Signal;

#[test]
fn test_new_signal_is_reset() {
    let signal = Signal::new();
    assert!(!signal.is_set());
    assert!(!signal.wait_timeout(Duration::from_millis(10)));
}

#[test]
fn test_set_survives_until_reset() {
    let signal = Signal::new();
    signal.set();

    // Waiting does not consume a manual-reset signal
    signal.wait();
    assert!(signal.wait_timeout(Duration::from_millis(1)));
    assert!(signal.is_set());

    signal.reset();
    assert!(!signal.is_set());
}

#[test]
fn test_set_wakes_blocked_waiter() {
    let signal = Arc::new(Signal::new());

    let waiter = {
        let signal = Arc::clone(&signal);
        thread::spawn(move || signal.wait_timeout(Duration::from_secs(5)))
    };

    thread::sleep(Duration::from_millis(20));
    signal.set();

    assert!(waiter.join().unwrap());
}
