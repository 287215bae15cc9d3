//! Wake signal
//!
//! Manual-reset event: stays set until explicitly reset, so a `set` that
//! races with a waiter is never lost.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Manual-reset event used to wake a connection's send thread
pub struct Signal {
    set: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    /// Create a signal in the reset state
    pub fn new() -> Self {
        Self {
            set: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Set the signal and wake every waiter
    pub fn set(&self) {
        let mut set = self.set.lock();
        *set = true;
        self.cond.notify_all();
    }

    /// Return the signal to the reset state
    pub fn reset(&self) {
        *self.set.lock() = false;
    }

    /// True if the signal is currently set
    pub fn is_set(&self) -> bool {
        *self.set.lock()
    }

    /// Block until the signal is set
    pub fn wait(&self) {
        let mut set = self.set.lock();
        while !*set {
            self.cond.wait(&mut set);
        }
    }

    /// Block until the signal is set or the timeout elapses
    ///
    /// Returns true if the signal was set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut set = self.set.lock();
        if !*set {
            // Spurious wakeups are absorbed by wait_while_for
            self.cond.wait_while_for(&mut set, |set| !*set, timeout);
        }
        *set
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
