//! State shared by the facade and both worker threads.

use kvrelay_concurrency::{BoundedQueue, OverflowPolicy};
use kvrelay_core::{Connection, Tuning};

use crate::command::Command;
use crate::mode::{ExecutorMode, ModeCell};
use crate::stats::{Counters, DispatchStats};

/// The three queues are the only channels between threads. A connection is
/// in the pool, in `to_reconnect`, held by the reconnection manager, or in
/// `from_reconnect`, never in two of them.
pub(crate) struct Shared {
    pub(crate) commands: BoundedQueue<Command>,
    pub(crate) to_reconnect: BoundedQueue<Box<dyn Connection>>,
    pub(crate) from_reconnect: BoundedQueue<Box<dyn Connection>>,
    pub(crate) mode: ModeCell,
    pub(crate) counters: Counters,
    pub(crate) tuning: Tuning,
}

impl Shared {
    pub(crate) fn new(tuning: Tuning) -> Self {
        Self {
            commands: BoundedQueue::bounded(tuning.queue_capacity, OverflowPolicy::DropOldest),
            to_reconnect: BoundedQueue::unbounded(),
            from_reconnect: BoundedQueue::unbounded(),
            mode: ModeCell::new(ExecutorMode::Running),
            counters: Counters::default(),
            tuning,
        }
    }

    pub(crate) fn stats(&self) -> DispatchStats {
        use std::sync::atomic::Ordering;

        let queue = self.commands.stats();
        DispatchStats {
            queued: queue.len,
            executed: self.counters.executed.load(Ordering::Relaxed),
            retried: self.counters.retried.load(Ordering::Relaxed),
            dropped: queue.dropped,
            live_connections: self.counters.live.load(Ordering::SeqCst),
            recycling: self.counters.recycling.load(Ordering::SeqCst),
            reconnects: self.counters.reconnects.load(Ordering::Relaxed),
        }
    }
}
