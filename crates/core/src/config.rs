//! Relay configuration via `kvrelay.toml`
//!
//! The file lists the backend addresses in preference order and the few
//! tuning knobs of the dispatcher. A default file can be written on first
//! use; edit it and restart to change settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Config file name looked up by the command-line harness.
pub const CONFIG_FILE_NAME: &str = "kvrelay.toml";

/// Default bound of the caller-to-processor command queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 65_536;

/// Bounded wait used by both workers when dequeuing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Delay between two reconnect attempts of a failing connection.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Timing and sizing constants handed to a dispatcher at construction.
///
/// These are fixed for the lifetime of a dispatcher; no operation accepts a
/// per-call timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    /// Maximum number of queued commands before the oldest is evicted.
    pub queue_capacity: usize,
    /// Bounded wait of every worker dequeue.
    pub poll_interval: Duration,
    /// Backoff after a failed reconnect attempt.
    pub reconnect_delay: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single line output.
    #[default]
    Compact,
    /// Structured JSON suitable for log shippers.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::config(format!(
                "unsupported log format '{}'. Expected \"compact\" or \"json\".",
                other
            ))),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing-subscriber` filter expression.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

/// Relay configuration loaded from `kvrelay.toml`.
///
/// # Example
///
/// ```toml
/// addresses = ["10.0.0.1:8087", "10.0.0.2:8087"]
/// queue_capacity = 65536
/// poll_interval_ms = 1000
/// reconnect_delay_ms = 5000
///
/// [log]
/// filter = "info"
/// format = "compact"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Backend addresses in preference order.
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Command queue bound.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Worker dequeue wait in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Reconnect backoff in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_millis() as u64
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            queue_capacity: default_queue_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            log: LogConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Check the values that would make a dispatcher misbehave.
    ///
    /// Addresses are not validated here: invalid entries are skipped with a
    /// warning when the dispatcher is built.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be greater than zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config("poll_interval_ms must be greater than zero"));
        }
        Ok(())
    }

    /// The dispatcher tuning described by this config.
    pub fn tuning(&self) -> Tuning {
        Tuning {
            queue_capacity: self.queue_capacity,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# kvrelay configuration
#
# Backend addresses ("host:port"), first entry preferred.
# Invalid entries are skipped with a warning.
addresses = []

# Maximum queued commands. When full, the oldest queued command is dropped.
queue_capacity = 65536

# Bounded wait (ms) of the worker threads when their queues are empty.
poll_interval_ms = 1000

# Delay (ms) between reconnect attempts of a broken connection.
reconnect_delay_ms = 5000

[log]
# tracing filter expression, e.g. "info" or "kvrelay=debug"
filter = "info"
# "compact" or "json"
format = "compact"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: RelayConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
