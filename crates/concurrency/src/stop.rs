//! Cancellation token for worker loops.
//!
//! A token is handed to a worker when it starts. The worker polls
//! [`StopToken::is_cancelled`] between iterations and sleeps through
//! [`StopToken::wait_timeout`] so that cancellation also cuts a backoff short.
//! Clones share the same state.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared, clonable cancellation flag with a wakeup signal.
#[derive(Clone, Default)]
pub struct StopToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token and wake every waiter.
    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock();
        *cancelled = true;
        cvar.notify_all();
    }

    /// True once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleep for `timeout` unless the token is cancelled first.
    ///
    /// Returns `true` if the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock();
        while !*cancelled {
            if cvar.wait_until(&mut cancelled, deadline).timed_out() {
                break;
            }
        }
        *cancelled
    }
}

impl std::fmt::Debug for StopToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
