//! kvrelay - resilient command dispatch in front of key-value backends
//!
//! Callers submit PUT, GET and DELETE operations to a [`Dispatcher`]. A single
//! background thread executes them against the first live backend connection.
//! A second thread revives connections that broke, and commands that hit a
//! broken connection are retried without the caller noticing.
//!
//! # Quick Start
//!
//! ```ignore
//! use kvrelay::{Dispatcher, RespConnector, Tuning};
//!
//! let dispatcher = Dispatcher::connect(
//!     &["10.0.0.1:6379", "10.0.0.2:6379"],
//!     &RespConnector::default(),
//!     Tuning::default(),
//! )?;
//!
//! dispatcher.put("user:123", "Alice");
//! dispatcher.sync()?;
//! assert_eq!(dispatcher.get("user:123"), Some("Alice".to_string()));
//! dispatcher.stop(false);
//! ```

pub use kvrelay_backend::{
    FaultHandle, MemoryConnection, MemoryConnector, MemoryStore, RespConnection, RespConnector,
};
pub use kvrelay_concurrency::{BoundedQueue, OverflowPolicy, StopToken};
pub use kvrelay_core::{
    parse_address_list, Connection, Connector, Endpoint, Error, LogConfig, LogFormat, RelayConfig,
    Result, Status, Tuning,
};
pub use kvrelay_dispatch::{Command, CommandKind, DispatchStats, Dispatcher, ExecutorMode};
