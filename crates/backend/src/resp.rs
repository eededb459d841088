//! RESP2 client connection for Redis-compatible key-value servers.
//!
//! One [`RespConnection`] owns one blocking TCP stream. Requests are encoded
//! as RESP arrays of bulk strings (`SET`, `GET`, `DEL`) and replies are read
//! with a small recursive decoder. A failed write or an undecodable reply
//! leaves the stream in an unknown state, so the stream is dropped and every
//! later operation reports a transport failure until [`Connection::reconnect`]
//! dials the endpoint again.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use kvrelay_core::{Connection, Connector, Endpoint, Error, Result, Status};
use thiserror::Error;
use tracing::debug;

/// Nesting limit for array replies.
const MAX_DEPTH: usize = 8;

/// Largest bulk string accepted from a server (512 MiB, the RESP limit).
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// A decoded RESP2 value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// `+OK`
    Simple(String),
    /// `-ERR message`
    Error(String),
    /// `:42`
    Integer(i64),
    /// `$3\r\nfoo` or the null bulk `$-1`
    Bulk(Option<Vec<u8>>),
    /// `*2 ...` or the null array `*-1`
    Array(Option<Vec<RespValue>>),
}

/// Failure while exchanging one request/reply pair.
#[derive(Debug, Error)]
pub enum RespError {
    /// The socket failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,
    /// The reply does not follow RESP2.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl RespError {
    fn into_status(self) -> Status {
        match self {
            RespError::Malformed(reason) => Status::Protocol(reason),
            other => Status::Transport(other.to_string()),
        }
    }
}

/// Encode `args` as a RESP array of bulk strings into `buf`.
pub fn encode_command(args: &[&[u8]], buf: &mut Vec<u8>) {
    buf.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        buf.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.extend_from_slice(arg);
        buf.extend_from_slice(b"\r\n");
    }
}

/// Read one complete RESP value from `reader`.
pub fn read_value<R: BufRead>(reader: &mut R) -> std::result::Result<RespValue, RespError> {
    read_nested(reader, 0)
}

fn read_nested<R: BufRead>(
    reader: &mut R,
    depth: usize,
) -> std::result::Result<RespValue, RespError> {
    if depth > MAX_DEPTH {
        return Err(RespError::Malformed("array nesting too deep".to_string()));
    }
    let line = read_line(reader)?;
    let (tag, body) = match line.split_first() {
        Some((tag, body)) => (*tag, body),
        None => return Err(RespError::Malformed("empty reply line".to_string())),
    };
    let text = || String::from_utf8_lossy(body).into_owned();
    match tag {
        b'+' => Ok(RespValue::Simple(text())),
        b'-' => Ok(RespValue::Error(text())),
        b':' => Ok(RespValue::Integer(parse_int(body)?)),
        b'$' => {
            let len = parse_int(body)?;
            if len < 0 {
                return Ok(RespValue::Bulk(None));
            }
            if len > MAX_BULK_LEN {
                return Err(RespError::Malformed(format!("bulk length {} too large", len)));
            }
            let mut data = vec![0u8; len as usize + 2];
            read_exact(reader, &mut data)?;
            if !data.ends_with(b"\r\n") {
                return Err(RespError::Malformed("bulk string not terminated".to_string()));
            }
            data.truncate(len as usize);
            Ok(RespValue::Bulk(Some(data)))
        }
        b'*' => {
            let len = parse_int(body)?;
            if len < 0 {
                return Ok(RespValue::Array(None));
            }
            let mut items = Vec::with_capacity(len.min(64) as usize);
            for _ in 0..len {
                items.push(read_nested(reader, depth + 1)?);
            }
            Ok(RespValue::Array(Some(items)))
        }
        other => Err(RespError::Malformed(format!(
            "unknown type byte 0x{:02x}",
            other
        ))),
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> std::result::Result<Vec<u8>, RespError> {
    let mut line = Vec::with_capacity(64);
    let n = reader.read_until(b'\n', &mut line)?;
    if n == 0 {
        return Err(RespError::Closed);
    }
    if !line.ends_with(b"\r\n") {
        return Err(RespError::Malformed("line not terminated by CRLF".to_string()));
    }
    line.truncate(line.len() - 2);
    Ok(line)
}

fn read_exact<R: BufRead>(reader: &mut R, buf: &mut [u8]) -> std::result::Result<(), RespError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            RespError::Closed
        } else {
            RespError::Io(e)
        }
    })
}

fn parse_int(body: &[u8]) -> std::result::Result<i64, RespError> {
    std::str::from_utf8(body)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            RespError::Malformed(format!(
                "invalid integer '{}'",
                String::from_utf8_lossy(body)
            ))
        })
}

/// Socket options for RESP connections.
#[derive(Debug, Clone, Copy)]
pub struct RespConnector {
    /// Limit on establishing the TCP session.
    pub connect_timeout: Duration,
    /// Read and write timeout of an established session.
    pub io_timeout: Option<Duration>,
}

impl Default for RespConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            io_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl RespConnector {
    fn dial(&self, endpoint: &Endpoint) -> io::Result<BufReader<TcpStream>> {
        let mut last_error = None;
        for addr in (endpoint.host(), endpoint.port()).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(self.io_timeout)?;
                    stream.set_write_timeout(self.io_timeout)?;
                    stream.set_nodelay(true)?;
                    return Ok(BufReader::new(stream));
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing")
        }))
    }
}

impl Connector for RespConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>> {
        let reader = self
            .dial(endpoint)
            .map_err(|e| Error::connect(endpoint, e.to_string()))?;
        debug!(target: "kvrelay::backend", endpoint = %endpoint, "RESP connection established");
        Ok(Box::new(RespConnection {
            endpoint: endpoint.clone(),
            options: *self,
            reader: Some(reader),
            write_buf: Vec::with_capacity(256),
        }))
    }
}

/// A RESP2 session with one server.
pub struct RespConnection {
    endpoint: Endpoint,
    options: RespConnector,
    reader: Option<BufReader<TcpStream>>,
    write_buf: Vec<u8>,
}

impl RespConnection {
    fn exec(&mut self, args: &[&[u8]]) -> std::result::Result<RespValue, Status> {
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Err(Status::Transport("not connected".to_string())),
        };
        self.write_buf.clear();
        encode_command(args, &mut self.write_buf);

        let result = (|| {
            let stream = reader.get_mut();
            stream.write_all(&self.write_buf)?;
            stream.flush()?;
            read_value(reader)
        })();

        result.map_err(|e| {
            // The stream position is unknown after any failure.
            self.reader = None;
            e.into_status()
        })
    }
}

fn unexpected(reply: &RespValue) -> Status {
    Status::Protocol(format!("unexpected reply {:?}", reply))
}

fn rejected(message: String) -> Status {
    Status::Rejected { code: -1, message }
}

impl Connection for RespConnection {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn put(&mut self, key: &str, value: &str) -> Status {
        match self.exec(&[b"SET", key.as_bytes(), value.as_bytes()]) {
            Ok(RespValue::Simple(_)) => Status::Ok,
            Ok(RespValue::Error(message)) => rejected(message),
            Ok(other) => unexpected(&other),
            Err(status) => status,
        }
    }

    fn get(&mut self, key: &str) -> (Status, Option<String>) {
        match self.exec(&[b"GET", key.as_bytes()]) {
            Ok(RespValue::Bulk(Some(data))) => (
                Status::Ok,
                Some(String::from_utf8_lossy(&data).into_owned()),
            ),
            Ok(RespValue::Bulk(None)) => (Status::NotFound, None),
            Ok(RespValue::Error(message)) => (rejected(message), None),
            Ok(other) => (unexpected(&other), None),
            Err(status) => (status, None),
        }
    }

    fn delete(&mut self, key: &str) -> Status {
        match self.exec(&[b"DEL", key.as_bytes()]) {
            Ok(RespValue::Integer(0)) => Status::NotFound,
            Ok(RespValue::Integer(_)) => Status::Ok,
            Ok(RespValue::Error(message)) => rejected(message),
            Ok(other) => unexpected(&other),
            Err(status) => status,
        }
    }

    fn reconnect(&mut self) -> bool {
        self.reader = None;
        match self.options.dial(&self.endpoint) {
            Ok(reader) => {
                self.reader = Some(reader);
                true
            }
            Err(e) => {
                debug!(
                    target: "kvrelay::backend",
                    endpoint = %self.endpoint,
                    error = %e,
                    "RESP reconnect failed"
                );
                false
            }
        }
    }
}
