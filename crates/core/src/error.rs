//! Error types for kvrelay
//!
//! Only construction-time and infrastructure failures are errors. Results
//! reported by a backend are [`Status`](crate::Status) values and never
//! surface to callers as an `Error`.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for kvrelay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for kvrelay
#[derive(Debug, Error)]
pub enum Error {
    /// The dispatcher was given an empty address list
    #[error("no backend addresses configured")]
    NoAddresses,

    /// An address string is not a valid `host:port` pair
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The rejected address text
        address: String,
        /// Why it was rejected
        reason: String,
    },

    /// None of the configured addresses produced a connection
    #[error("no backend connection could be created ({attempted} addresses tried)")]
    NoConnections {
        /// Number of addresses that were considered
        attempted: usize,
    },

    /// A connector could not reach one endpoint
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect {
        /// Endpoint that could not be reached
        endpoint: String,
        /// Failure description reported by the connector
        reason: String,
    },

    /// Configuration file could not be read, parsed or validated
    #[error("configuration error: {reason}")]
    Config {
        /// Failure description
        reason: String,
    },

    /// A worker thread could not be started
    #[error("failed to spawn {thread} thread: {source}")]
    Spawn {
        /// Name of the thread that failed to start
        thread: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build a configuration error from any displayable reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    /// Build a connect error for `endpoint`.
    pub fn connect(endpoint: impl ToString, reason: impl Into<String>) -> Self {
        Error::Connect {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the errors that make a dispatcher impossible to build.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NoAddresses | Error::NoConnections { .. } | Error::Config { .. }
        )
    }
}
