//! Resilient command dispatch for kvrelay
//!
//! This crate provides the dispatch engine in front of a key-value backend:
//! - Dispatcher: the facade callers share (put, get, delete, sync, stop)
//! - Command processor: the single worker that executes queued commands
//!   against the first live connection and recycles broken ones
//! - Reconnection manager: the worker that revives broken connections and
//!   hands them back
//!
//! Connection failures never reach callers. A command that hits a
//! connection-level failure is queued again and retried on another
//! connection once one is available.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;
mod dispatcher;
mod mode;
mod pool;
mod processor;
mod reconnector;
mod shared;
mod stats;

pub use command::{Command, CommandKind};
pub use dispatcher::Dispatcher;
pub use mode::ExecutorMode;
pub use pool::ConnectionPool;
pub use stats::DispatchStats;
