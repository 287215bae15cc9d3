//! Queue Module
//!
//! Cross-thread handoff primitives used by each connection's send path.
//!
//! ## Responsibilities
//! - Buffer outbound payloads between `Peer::send` and the send thread
//! - Drain every pending item in one step (one lock, one socket write)
//! - Wake the send thread when new items arrive
//!
//! ## Design Choice
//! Using a Vec behind a parking_lot Mutex:
//! - Enqueue is a push under a short lock
//! - Drain swaps the Vec out, so the lock is held for O(1)
//! - The signal is a manual-reset event (Mutex<bool> + Condvar)

mod batch;
mod signal;

pub use batch::BatchQueue;
pub use signal::Signal;
