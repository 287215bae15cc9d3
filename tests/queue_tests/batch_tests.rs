//! BatchQueue Tests
//!
//! Tests verify:
//! - FIFO order within a drain
//! - Empty drains return None
//! - No loss or duplication under concurrent enqueue/drain
//! - Per-producer ordering across drains

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use framelink::queue::BatchQueue;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_queue_is_empty() {
    let queue: BatchQueue<u32> = BatchQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
    assert_eq!(queue.try_dequeue_all(), None);
}

#[test]
fn test_dequeue_all_returns_fifo_batch() {
    let queue = BatchQueue::new();
    queue.enqueue(1);
    queue.enqueue(2);
    queue.enqueue(3);

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.try_dequeue_all(), Some(vec![1, 2, 3]));
    assert!(queue.is_empty());
}

#[test]
fn test_dequeue_all_twice_second_is_none() {
    let queue = BatchQueue::new();
    queue.enqueue("a");

    assert_eq!(queue.try_dequeue_all(), Some(vec!["a"]));
    assert_eq!(queue.try_dequeue_all(), None);
}

#[test]
fn test_enqueue_after_drain_starts_new_batch() {
    let queue = BatchQueue::new();
    queue.enqueue(1);
    queue.try_dequeue_all();
    queue.enqueue(2);
    queue.enqueue(3);

    assert_eq!(queue.try_dequeue_all(), Some(vec![2, 3]));
}

#[test]
fn test_clear_drops_items() {
    let queue = BatchQueue::new();
    queue.enqueue(1);
    queue.enqueue(2);
    queue.clear();

    assert!(queue.is_empty());
    assert_eq!(queue.try_dequeue_all(), None);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_enqueue_and_drain_loses_nothing() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 10_000;

    let queue = Arc::new(BatchQueue::new());
    let done = Arc::new(AtomicBool::new(false));

    // Drainer collects batches while producers are running
    let drainer = {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut collected = Vec::new();
            loop {
                let finished = done.load(Ordering::Acquire);
                if let Some(batch) = queue.try_dequeue_all() {
                    collected.extend(batch);
                } else if finished {
                    break;
                } else {
                    thread::yield_now();
                }
            }
            collected
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.enqueue((p, i));
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    done.store(true, Ordering::Release);

    let collected = drainer.join().unwrap();
    assert_eq!(collected.len(), PRODUCERS * PER_PRODUCER);

    // Each producer's items appear exactly once and in enqueue order
    let mut next = vec![0usize; PRODUCERS];
    for (p, i) in collected {
        assert_eq!(i, next[p], "producer {} out of order", p);
        next[p] += 1;
    }
    assert!(next.iter().all(|&n| n == PER_PRODUCER));
}

#[test]
fn test_concurrent_drainers_never_duplicate() {
    const ITEMS: usize = 20_000;

    let queue = Arc::new(BatchQueue::new());
    for i in 0..ITEMS {
        queue.enqueue(i);
    }

    let drainers: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.try_dequeue_all().unwrap_or_default())
        })
        .collect();

    let mut all: Vec<usize> = drainers
        .into_iter()
        .flat_map(|d| d.join().unwrap())
        .collect();
    all.sort_unstable();

    assert_eq!(all, (0..ITEMS).collect::<Vec<_>>());
}
