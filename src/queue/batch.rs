//! Batch queue implementation
//!
//! FIFO queue optimized for "enqueue one, dequeue everything" access.

use std::mem;

use parking_lot::Mutex;

/// Thread-safe FIFO that is drained as a whole
///
/// Any number of threads may call `enqueue` while another thread calls
/// `try_dequeue_all`. Every item comes out exactly once, in the order in
/// which the enqueues took the lock.
pub struct BatchQueue<T> {
    items: Mutex<Vec<T>>,
}

impl<T> BatchQueue<T> {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Append an item
    pub fn enqueue(&self, item: T) {
        self.items.lock().push(item);
    }

    /// Remove and return every queued item in FIFO order
    ///
    /// Returns `None` if the queue was empty.
    pub fn try_dequeue_all(&self) -> Option<Vec<T>> {
        let mut items = self.items.lock();
        if items.is_empty() {
            return None;
        }
        // Hand the filled Vec to the caller, leave a fresh one behind
        Some(mem::take(&mut *items))
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drop every queued item
    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

impl<T> Default for BatchQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
