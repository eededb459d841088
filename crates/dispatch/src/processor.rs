//! Command processor loop.
//!
//! Runs on its own thread and is the only code that touches the
//! [`ConnectionPool`]. Every command goes to the first connection. A status
//! the connection classifies as a connection error moves that connection to
//! the reconnection manager and puts the command back at the tail of the
//! command queue; any other status completes the command.

use tracing::{debug, trace};

use kvrelay_core::Connection;

use crate::command::Command;
use crate::mode::ExecutorMode;
use crate::pool::ConnectionPool;
use crate::shared::Shared;

/// Process commands until the mode says otherwise, then hand the pool back.
///
/// Exits when the mode is [`ExecutorMode::StopImmediately`], or when it is
/// [`ExecutorMode::DrainAndStop`] and the command queue is empty.
pub(crate) fn run(shared: &Shared, mut pool: ConnectionPool) -> ConnectionPool {
    let poll = shared.tuning.poll_interval;
    shared.counters.set_live(pool.len());
    debug!(
        target: "kvrelay::processor",
        connections = pool.len(),
        "command processor started"
    );

    loop {
        let mode = shared.mode.get();
        if mode == ExecutorMode::StopImmediately {
            break;
        }

        while let Some(connection) = shared.from_reconnect.try_dequeue() {
            readmit(shared, &mut pool, connection);
        }

        if pool.is_empty() {
            if mode == ExecutorMode::DrainAndStop && shared.commands.is_empty() {
                break;
            }
            if let Some(connection) = shared.from_reconnect.dequeue_timeout(poll) {
                readmit(shared, &mut pool, connection);
            }
            continue;
        }

        let next = match mode {
            // Nothing new is worth waiting for once draining.
            ExecutorMode::DrainAndStop => shared.commands.try_dequeue(),
            _ => shared.commands.dequeue_timeout(poll),
        };
        let command = match next {
            Some(command) => command,
            None if shared.mode.get() == ExecutorMode::DrainAndStop => break,
            None => continue,
        };

        if shared.mode.get() == ExecutorMode::StopImmediately {
            trace!(
                target: "kvrelay::processor",
                kind = %command.kind(),
                key = command.key(),
                "discarding command on immediate stop"
            );
            break;
        }

        execute(shared, &mut pool, command);
    }

    debug!(
        target: "kvrelay::processor",
        mode = ?shared.mode.get(),
        connections = pool.len(),
        "command processor stopped"
    );
    pool
}

fn readmit(shared: &Shared, pool: &mut ConnectionPool, connection: Box<dyn Connection>) {
    debug!(
        target: "kvrelay::processor",
        endpoint = %connection.endpoint(),
        "recovered connection back in pool"
    );
    pool.push(connection);
    shared.counters.readmitted(pool.len());
}

fn execute(shared: &Shared, pool: &mut ConnectionPool, command: Command) {
    let connection = match pool.first_mut() {
        Some(connection) => connection,
        None => {
            shared.commands.enqueue(command);
            return;
        }
    };

    let (status, value) = match &command {
        Command::Put { key, value } => (connection.put(key, value), None),
        Command::Get { key, .. } => connection.get(key),
        Command::Delete { key } => (connection.delete(key), None),
    };

    if connection.is_connection_error(&status) {
        if let Some(broken) = pool.take_first() {
            debug!(
                target: "kvrelay::processor",
                endpoint = %broken.endpoint(),
                kind = %command.kind(),
                key = command.key(),
                %status,
                "connection failed, handing it to the reconnection manager"
            );
            shared.counters.recycled(pool.len());
            shared.to_reconnect.enqueue(broken);
        }
        shared.counters.retried();
        shared.commands.enqueue(command);
        return;
    }

    trace!(
        target: "kvrelay::processor",
        kind = %command.kind(),
        key = command.key(),
        %status,
        "command executed"
    );
    shared.counters.executed();
    if let Command::Get { reply, .. } = command {
        // The caller may have gone away; nothing to do then.
        let _ = reply.send(value);
    }
}
