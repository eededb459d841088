//! Dispatcher counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot of dispatcher activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Commands waiting in the command queue.
    pub queued: usize,
    /// Commands executed without a connection failure.
    pub executed: u64,
    /// Commands queued again after a connection failure.
    pub retried: u64,
    /// Commands evicted by queue overflow.
    pub dropped: u64,
    /// Connections in the pool.
    pub live_connections: usize,
    /// Connections handed to the reconnection manager and not yet back in
    /// the pool.
    pub recycling: usize,
    /// Successful reconnects.
    pub reconnects: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) executed: AtomicU64,
    pub(crate) retried: AtomicU64,
    pub(crate) reconnects: AtomicU64,
    pub(crate) live: AtomicUsize,
    pub(crate) recycling: AtomicUsize,
}

impl Counters {
    pub(crate) fn executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn retried(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reconnected(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection left the pool for the reconnection manager.
    pub(crate) fn recycled(&self, live: usize) {
        self.recycling.fetch_add(1, Ordering::SeqCst);
        self.live.store(live, Ordering::SeqCst);
    }

    /// A recovered connection joined the pool.
    pub(crate) fn readmitted(&self, live: usize) {
        self.live.store(live, Ordering::SeqCst);
        self.recycling.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn set_live(&self, live: usize) {
        self.live.store(live, Ordering::SeqCst);
    }
}
