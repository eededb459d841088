//! Ordered set of live connections owned by the command processor.

use std::fmt;

use kvrelay_core::{Connection, Endpoint};

/// Live connections in preference order.
///
/// Only the command processor touches a pool, so it carries no lock. The pool
/// moves into the processor thread at start and comes back out of
/// `JoinHandle::join` when the thread exits.
#[derive(Default)]
pub struct ConnectionPool {
    connections: Vec<Box<dyn Connection>>,
}

impl ConnectionPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection commands are dispatched to.
    pub fn first_mut(&mut self) -> Option<&mut Box<dyn Connection>> {
        self.connections.first_mut()
    }

    /// Remove and return the first connection.
    pub fn take_first(&mut self) -> Option<Box<dyn Connection>> {
        if self.connections.is_empty() {
            None
        } else {
            Some(self.connections.remove(0))
        }
    }

    /// Append a connection behind the current ones.
    pub fn push(&mut self, connection: Box<dyn Connection>) {
        self.connections.push(connection);
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// True when no connection is live.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Endpoints of the live connections, first one first.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.connections
            .iter()
            .map(|c| c.endpoint().clone())
            .collect()
    }
}

impl FromIterator<Box<dyn Connection>> for ConnectionPool {
    fn from_iter<I: IntoIterator<Item = Box<dyn Connection>>>(iter: I) -> Self {
        Self {
            connections: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.connections.iter().map(|c| c.endpoint().to_string()))
            .finish()
    }
}
