//! Backend capability interface.
//!
//! The dispatcher never talks to a storage backend directly. It holds boxed
//! [`Connection`]s created by a [`Connector`] and moves them between its
//! worker threads, so connections must be `Send` but are never shared.

use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::status::Status;

/// A single session with one backend endpoint.
///
/// Implementations report failures through [`Status`] and decide for
/// themselves which statuses mean the session is unusable.
pub trait Connection: Send {
    /// The endpoint this connection talks to.
    fn endpoint(&self) -> &Endpoint;

    /// Store `value` under `key`.
    fn put(&mut self, key: &str, value: &str) -> Status;

    /// Fetch the value stored under `key`.
    ///
    /// The value is `None` whenever the backend had nothing to return.
    fn get(&mut self, key: &str) -> (Status, Option<String>);

    /// Remove `key`.
    fn delete(&mut self, key: &str) -> Status;

    /// Try to re-establish the session. Returns `true` on success.
    fn reconnect(&mut self) -> bool;

    /// Classify `status` as a connection-level failure.
    ///
    /// Only statuses classified here trigger connection recycling and a retry
    /// of the command; everything else is treated as a completed command.
    fn is_connection_error(&self, status: &Status) -> bool {
        status.is_transport_failure()
    }
}

/// Factory for backend connections.
pub trait Connector: Send + Sync {
    /// Open a connection to `endpoint`.
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>>;
}

impl<F> Connector for F
where
    F: Fn(&Endpoint) -> Result<Box<dyn Connection>> + Send + Sync,
{
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>> {
        self(endpoint)
    }
}
