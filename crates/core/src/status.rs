//! Backend result codes.
//!
//! Every backend operation reports a [`Status`]. The dispatcher only cares
//! whether a status means the connection is unusable; that decision belongs
//! to the connection (see [`Connection::is_connection_error`]). Any other
//! status, including `NotFound` and `Rejected`, completes the command.
//!
//! [`Connection::is_connection_error`]: crate::Connection::is_connection_error

use std::fmt;

/// Outcome of a single backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The operation succeeded
    Ok,
    /// The key does not exist
    NotFound,
    /// The backend understood the request and refused it
    Rejected {
        /// Backend specific code
        code: i64,
        /// Backend supplied message
        message: String,
    },
    /// The network session failed (refused, reset, timed out)
    Transport(String),
    /// The backend reply could not be decoded
    Protocol(String),
}

impl Status {
    /// True for `Ok`.
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }

    /// True when the session itself is broken rather than the request.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Status::Transport(_) | Status::Protocol(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::NotFound => write!(f, "not found"),
            Status::Rejected { code, message } => write!(f, "rejected ({}): {}", code, message),
            Status::Transport(reason) => write!(f, "transport failure: {}", reason),
            Status::Protocol(reason) => write!(f, "protocol failure: {}", reason),
        }
    }
}
