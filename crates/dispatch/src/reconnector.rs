//! Reconnection manager loop.
//!
//! Takes broken connections from the processor, retries them without limit
//! and hands recovered ones back. A failed attempt puts the connection at the
//! tail of its input queue and backs off for the configured delay.
//!
//! The owner stops the loop by cancelling the token and closing
//! `to_reconnect`; either one alone may leave it waiting for a full poll.

use tracing::{debug, info};

use kvrelay_concurrency::StopToken;

use crate::shared::Shared;

pub(crate) fn run(shared: &Shared, token: &StopToken) {
    let poll = shared.tuning.poll_interval;
    let delay = shared.tuning.reconnect_delay;
    debug!(target: "kvrelay::reconnect", "reconnection manager started");

    while !token.is_cancelled() {
        let mut connection = match shared.to_reconnect.dequeue_timeout(poll) {
            Some(connection) => connection,
            None => continue,
        };

        if connection.reconnect() {
            info!(
                target: "kvrelay::reconnect",
                endpoint = %connection.endpoint(),
                "connection recovered"
            );
            shared.counters.reconnected();
            shared.from_reconnect.enqueue(connection);
        } else {
            debug!(
                target: "kvrelay::reconnect",
                endpoint = %connection.endpoint(),
                retry_in_ms = delay.as_millis() as u64,
                "reconnect failed"
            );
            shared.to_reconnect.enqueue(connection);
            token.wait_timeout(delay);
        }
    }

    debug!(target: "kvrelay::reconnect", "reconnection manager stopped");
}
