//! Blocking FIFO queue with an optional bound.
//!
//! The queue is shared by any number of producer and consumer threads. When a
//! bounded queue is full, the configured [`OverflowPolicy`] decides whether
//! the new item is refused or the oldest item is evicted to make room.
//!
//! Items that are never dropped leave the queue in the order they entered it.
//!
//! [`BoundedQueue::close`] makes timed waits on an empty queue return at once
//! until [`BoundedQueue::reopen`]. Producers are not affected.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// What to do when an item is enqueued into a full queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Refuse the new item; the queue is unchanged.
    DropNewest,
    /// Evict the head of the queue, then append the new item.
    DropOldest,
}

/// Counters snapshot for a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Items currently queued.
    pub len: usize,
    /// Items lost to the overflow policy (refused or evicted).
    pub dropped: u64,
}

/// Thread-safe FIFO queue with blocking and bounded-wait dequeue.
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
    capacity: Option<usize>,
    policy: OverflowPolicy,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl<T> BoundedQueue<T> {
    /// Create a queue without a capacity bound.
    pub fn unbounded() -> Self {
        Self::build(None, OverflowPolicy::DropNewest)
    }

    /// Create a queue holding at most `capacity` items.
    ///
    /// A capacity of zero is treated as one.
    pub fn bounded(capacity: usize, policy: OverflowPolicy) -> Self {
        Self::build(Some(capacity.max(1)), policy)
    }

    fn build(capacity: Option<usize>, policy: OverflowPolicy) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.unwrap_or(0).min(1024))),
            ready: Condvar::new(),
            capacity,
            policy,
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Append `item`, waking one waiting consumer.
    ///
    /// Returns `false` only when the queue is full and the policy is
    /// [`OverflowPolicy::DropNewest`]. Under [`OverflowPolicy::DropOldest`]
    /// the new item is always accepted and the head is silently lost.
    pub fn enqueue(&self, item: T) -> bool {
        // Whatever gets dropped is released after the lock.
        let discarded;
        {
            let mut items = self.items.lock();
            let full = self.capacity.map_or(false, |cap| items.len() >= cap);
            if full {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                match self.policy {
                    OverflowPolicy::DropNewest => {
                        drop(items);
                        drop(item);
                        return false;
                    }
                    OverflowPolicy::DropOldest => {
                        discarded = items.pop_front();
                    }
                }
            } else {
                discarded = None;
            }
            items.push_back(item);
        }
        self.ready.notify_one();
        drop(discarded);
        true
    }

    /// Remove the head, waiting as long as it takes for one to arrive.
    ///
    /// Closing the queue does not end this wait.
    pub fn dequeue(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.ready.wait(&mut items);
        }
    }

    /// Remove the head, waiting at most `timeout`.
    ///
    /// Returns `None` when the timeout elapses with the queue still empty, or
    /// as soon as the queue is empty while closed. Spurious wakeups re-check
    /// the queue and keep waiting until the deadline.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }
            if self.ready.wait_until(&mut items, deadline).timed_out() {
                return items.pop_front();
            }
        }
    }

    /// Remove the head if there is one, without waiting.
    pub fn try_dequeue(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Wake every waiting consumer and stop timed waits from blocking.
    pub fn close(&self) {
        let _items = self.items.lock();
        self.closed.store(true, Ordering::SeqCst);
        self.ready.notify_all();
    }

    /// Let timed waits block again after [`close`](Self::close).
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    /// True between [`close`](Self::close) and [`reopen`](Self::reopen).
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Discard every queued item. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = std::mem::take(&mut *self.items.lock());
        removed.len()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Configured bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Configured overflow policy.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Return a snapshot of the queue counters.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            len: self.len(),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("closed", &self.is_closed())
            .finish()
    }
}
