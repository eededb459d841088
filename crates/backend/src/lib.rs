//! Backend collaborators for kvrelay
//!
//! The dispatcher only sees [`Connection`](kvrelay_core::Connection) trait
//! objects. This crate provides two implementations:
//! - `memory`: a process-local store shared by any number of connections,
//!   with per-endpoint fault injection for exercising the recovery paths
//! - `resp`: a blocking RESP2 client for Redis-compatible key-value servers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod resp;

pub use memory::{FaultHandle, MemoryConnection, MemoryConnector, MemoryStore};
pub use resp::{RespConnection, RespConnector, RespError, RespValue};
