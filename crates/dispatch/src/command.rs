//! Units of work queued for the command processor.

use std::fmt;
use std::sync::mpsc::{self, Receiver, SyncSender};

/// The operation a [`Command`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Store a value.
    Put,
    /// Fetch a value.
    Get,
    /// Remove a key.
    Delete,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Put => write!(f, "PUT"),
            CommandKind::Get => write!(f, "GET"),
            CommandKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// A queued operation.
///
/// A command is never modified once queued. When it fails on a broken
/// connection the same value is queued again.
#[derive(Debug)]
pub enum Command {
    /// Store `value` under `key`.
    Put {
        /// Target key
        key: String,
        /// Value to store
        value: String,
    },
    /// Fetch `key` and send the result on `reply`.
    ///
    /// The reply is sent once, after the GET executed without a connection
    /// failure. Dropping the command unexecuted closes the channel, which
    /// releases the waiting caller.
    Get {
        /// Target key
        key: String,
        /// One-shot result channel
        reply: SyncSender<Option<String>>,
    },
    /// Remove `key`.
    Delete {
        /// Target key
        key: String,
    },
}

impl Command {
    /// Build a PUT command.
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Command::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Build a DELETE command.
    pub fn delete(key: impl Into<String>) -> Self {
        Command::Delete { key: key.into() }
    }

    /// Build a GET command and the receiving end of its reply channel.
    pub fn get(key: impl Into<String>) -> (Self, Receiver<Option<String>>) {
        let (reply, receiver) = mpsc::sync_channel(1);
        (
            Command::Get {
                key: key.into(),
                reply,
            },
            receiver,
        )
    }

    /// The operation this command performs.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Put { .. } => CommandKind::Put,
            Command::Get { .. } => CommandKind::Get,
            Command::Delete { .. } => CommandKind::Delete,
        }
    }

    /// The key this command targets.
    pub fn key(&self) -> &str {
        match self {
            Command::Put { key, .. } | Command::Get { key, .. } | Command::Delete { key } => key,
        }
    }
}
