//! Core types and traits for kvrelay
//!
//! This crate defines the foundational types shared by every other crate:
//! - Error: the error taxonomy (configuration, connect, spawn failures)
//! - Endpoint: validated `host:port` backend addresses
//! - Status: the result space reported by a backend connection
//! - Connection / Connector: the capability interface to a storage backend
//! - RelayConfig / Tuning: `kvrelay.toml` configuration and timing constants

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod status;

pub use config::{
    LogConfig, LogFormat, RelayConfig, Tuning, CONFIG_FILE_NAME, DEFAULT_POLL_INTERVAL,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_RECONNECT_DELAY,
};
pub use connection::{Connection, Connector};
pub use endpoint::{parse_address_list, Endpoint};
pub use error::{Error, Result};
pub use status::Status;
