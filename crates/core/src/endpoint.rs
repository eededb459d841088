//! Backend addresses.
//!
//! An address is a `host:port` string. Validation is kept apart from list
//! splitting so the dispatcher can skip bad entries with a warning instead of
//! rejecting the whole list.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A validated backend address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Build an endpoint from parts. The port must be non-zero.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, Error> {
        let host = host.into();
        if host.is_empty() {
            return Err(invalid(&format!("{}:{}", host, port), "empty host"));
        }
        if port == 0 {
            return Err(invalid(&format!("{}:{}", host, port), "port must be non-zero"));
        }
        Ok(Endpoint { host, port })
    }

    /// Host name or IP literal.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let mut parts = address.split(':');
        let (host, port) = match (parts.next(), parts.next(), parts.next()) {
            (Some(host), Some(port), None) => (host, port),
            _ => return Err(invalid(address, "expected exactly one ':' separator")),
        };
        if host.is_empty() {
            return Err(invalid(address, "empty host"));
        }
        if port.is_empty() {
            return Err(invalid(address, "empty port"));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| invalid(address, "port is not a number in 1..=65535"))?;
        if port == 0 {
            return Err(invalid(address, "port must be non-zero"));
        }
        Ok(Endpoint {
            host: host.to_string(),
            port,
        })
    }
}

fn invalid(address: &str, reason: &str) -> Error {
    Error::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}

/// Split a comma separated address list into its raw entries.
///
/// Entries are not validated here; empty entries are kept so that the caller
/// reports them like any other invalid address.
pub fn parse_address_list(list: &str) -> Vec<String> {
    if list.is_empty() {
        return Vec::new();
    }
    list.split(',').map(|entry| entry.trim().to_string()).collect()
}
