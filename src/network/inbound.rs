//! Inbound event queue
//!
//! Lock-free FIFO shared by every receive thread of a Peer, drained by the
//! consumer through `Peer::get_next_message`.

use std::time::{Duration, Instant};

use crossbeam::queue::SegQueue;
use parking_lot::Mutex;

use crate::protocol::Message;

/// Shared inbound queue with an advisory depth warning
pub(crate) struct InboundQueue {
    queue: SegQueue<Message>,

    /// Depth above which a warning is logged
    warning_threshold: usize,

    /// Minimum time between two warnings
    warning_interval: Duration,

    /// When the last warning was logged
    last_warning: Mutex<Option<Instant>>,
}

impl InboundQueue {
    pub fn new(warning_threshold: usize, warning_interval: Duration) -> Self {
        Self {
            queue: SegQueue::new(),
            warning_threshold,
            warning_interval,
            last_warning: Mutex::new(None),
        }
    }

    /// Append an event
    ///
    /// Never blocks and never throttles; a growing queue only produces a
    /// rate-limited warning.
    pub fn push(&self, message: Message) {
        self.queue.push(message);

        let depth = self.queue.len();
        if depth > self.warning_threshold {
            self.warn_depth(depth);
        }
    }

    /// Remove the oldest event, if any
    pub fn pop(&self) -> Option<Message> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Log the depth unless a warning went out within the interval
    ///
    /// Returns true if a warning was logged.
    fn warn_depth(&self, depth: usize) -> bool {
        let now = Instant::now();
        let mut last = self.last_warning.lock();

        let due = match *last {
            Some(at) => now.duration_since(at) >= self.warning_interval,
            None => true,
        };
        if due {
            tracing::warn!(
                "Inbound queue is getting big ({} events), drain get_next_message more often",
                depth
            );
            *last = Some(now);
        }
        due
    }
}
