//! Dispatcher facade.
//!
//! A [`Dispatcher`] owns the command queue and the two worker threads. The
//! connection pool lives inside the processor thread and comes back when the
//! thread is joined. All entry points take
//! `&self`, so one dispatcher can be shared between caller threads through an
//! `Arc`.
//!
//! The `active` flag is read-locked by every submission and write-locked by
//! `stop`, so no command enters the queue after the final clear. Concurrent
//! `sync` calls are serialized by their own lock, which `stop` also takes
//! once it has signalled the processor. A `stop(true)` therefore cuts short a
//! `sync` that is waiting on an unreachable backend.
//!
//! # Example
//!
//! ```ignore
//! use kvrelay_backend::{MemoryConnector, MemoryStore};
//! use kvrelay_core::Tuning;
//! use kvrelay_dispatch::Dispatcher;
//!
//! let connector = MemoryConnector::new(MemoryStore::new());
//! let dispatcher = Dispatcher::connect(&["10.0.0.1:6379"], &connector, Tuning::default())?;
//! dispatcher.put("a", "1");
//! assert_eq!(dispatcher.get("a"), Some("1".to_string()));
//! dispatcher.stop(false);
//! ```

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use kvrelay_concurrency::StopToken;
use kvrelay_core::{Connector, Endpoint, Error, RelayConfig, Result, Tuning};

use crate::command::Command;
use crate::mode::ExecutorMode;
use crate::pool::ConnectionPool;
use crate::processor;
use crate::reconnector;
use crate::shared::Shared;
use crate::stats::DispatchStats;

const PROCESSOR_THREAD: &str = "kvrelay-processor";
const RECONNECT_THREAD: &str = "kvrelay-reconnect";

/// Worker handles.
struct Workers {
    processor: Option<JoinHandle<ConnectionPool>>,
    reconnector: Option<JoinHandle<()>>,
    token: StopToken,
}

/// Resilient dispatcher in front of a set of backend connections.
pub struct Dispatcher {
    shared: Arc<Shared>,
    active: RwLock<bool>,
    sync_lock: Mutex<()>,
    workers: Mutex<Workers>,
    endpoints: Vec<Endpoint>,
}

impl Dispatcher {
    /// Build a dispatcher over `addresses` and start its worker threads.
    ///
    /// Addresses are tried in order. Invalid addresses and addresses the
    /// connector cannot reach are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`Error::NoAddresses`] if `addresses` is empty.
    /// - [`Error::NoConnections`] if no address produced a connection.
    /// - [`Error::Spawn`] if a worker thread could not be started.
    pub fn connect<S, C>(addresses: &[S], connector: &C, tuning: Tuning) -> Result<Self>
    where
        S: AsRef<str>,
        C: Connector + ?Sized,
    {
        if addresses.is_empty() {
            return Err(Error::NoAddresses);
        }

        let mut pool = ConnectionPool::new();
        for address in addresses {
            let address = address.as_ref();
            let endpoint: Endpoint = match address.parse() {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    warn!(target: "kvrelay::dispatch", address, error = %e, "skipping invalid address");
                    continue;
                }
            };
            match connector.connect(&endpoint) {
                Ok(connection) => {
                    info!(target: "kvrelay::dispatch", endpoint = %endpoint, "backend connection created");
                    pool.push(connection);
                }
                Err(e) => {
                    warn!(target: "kvrelay::dispatch", endpoint = %endpoint, error = %e, "skipping unreachable address");
                }
            }
        }

        if pool.is_empty() {
            return Err(Error::NoConnections {
                attempted: addresses.len(),
            });
        }

        let endpoints = pool.endpoints();
        let shared = Arc::new(Shared::new(tuning));
        let token = StopToken::new();
        let reconnector = spawn_reconnector(&shared, &token)?;
        let processor = match spawn_processor(&shared, pool) {
            Ok(handle) => handle,
            Err(e) => {
                token.cancel();
                let _ = reconnector.join();
                return Err(e);
            }
        };

        Ok(Self {
            shared,
            active: RwLock::new(true),
            sync_lock: Mutex::new(()),
            workers: Mutex::new(Workers {
                processor: Some(processor),
                reconnector: Some(reconnector),
                token,
            }),
            endpoints,
        })
    }

    /// Build a dispatcher from a loaded configuration.
    pub fn from_config<C>(config: &RelayConfig, connector: &C) -> Result<Self>
    where
        C: Connector + ?Sized,
    {
        config.validate()?;
        Self::connect(config.addresses.as_slice(), connector, config.tuning())
    }

    /// Queue a PUT. Returns `false` if the dispatcher is not active.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.submit(Command::put(key, value))
    }

    /// Queue a DELETE. Returns `false` if the dispatcher is not active.
    pub fn delete(&self, key: impl Into<String>) -> bool {
        self.submit(Command::delete(key))
    }

    /// Fetch `key`, blocking until the GET has executed.
    ///
    /// There is no timeout: while no connection can reach the backend the
    /// call keeps waiting. Returns `None` when the key has no value, when the
    /// dispatcher is not active, or when the command is discarded by
    /// [`stop(true)`](Self::stop) or queue overflow.
    pub fn get(&self, key: impl Into<String>) -> Option<String> {
        let (command, reply) = Command::get(key);
        if !self.submit(command) {
            return None;
        }
        reply.recv().ok().flatten()
    }

    /// Block until every command queued before the call has executed, then
    /// resume.
    ///
    /// Returns early without resuming if [`stop`](Self::stop) is called
    /// meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the processor could not be restarted; the
    /// dispatcher is then stopped.
    pub fn sync(&self) -> Result<()> {
        let _serial = self.sync_lock.lock();
        let handle = {
            let active = self.active.read();
            if !*active {
                return Ok(());
            }
            let handle = match self.workers.lock().processor.take() {
                Some(handle) => handle,
                None => return Ok(()),
            };
            debug!(target: "kvrelay::dispatch", "sync: draining command queue");
            self.shared.mode.set(ExecutorMode::DrainAndStop);
            self.shared.commands.close();
            handle
        };

        let pool = join_processor(handle);

        let active = self.active.read();
        if !*active {
            debug!(
                target: "kvrelay::dispatch",
                connections = pool.len(),
                "sync: dispatcher stopped while draining"
            );
            return Ok(());
        }
        self.shared.commands.reopen();
        self.shared.mode.set(ExecutorMode::Running);

        match spawn_processor(&self.shared, pool) {
            Ok(handle) => {
                self.workers.lock().processor = Some(handle);
                debug!(target: "kvrelay::dispatch", "sync: processor restarted");
                Ok(())
            }
            Err(e) => {
                error!(target: "kvrelay::dispatch", error = %e, "sync: processor restart failed");
                drop(active);
                {
                    let mut active = self.active.write();
                    *active = false;
                    self.signal_stop(true);
                }
                self.finish(&mut self.workers.lock());
                Err(e)
            }
        }
    }

    /// Stop the dispatcher.
    ///
    /// With `stop_now` the command in flight completes and every other queued
    /// command is discarded; otherwise the queue is drained first. Once the
    /// dispatcher is inactive, `stop(false)` has no effect and `stop(true)`
    /// only hurries a drain that is still running.
    pub fn stop(&self, stop_now: bool) {
        let mode = if stop_now {
            ExecutorMode::StopImmediately
        } else {
            ExecutorMode::DrainAndStop
        };
        {
            let mut active = self.active.write();
            let first = std::mem::replace(&mut *active, false);
            if !first {
                if stop_now {
                    self.signal_stop(true);
                }
                return;
            }
            debug!(target: "kvrelay::dispatch", ?mode, "stopping dispatcher");
            self.signal_stop(stop_now);
        }

        // Waits out a sync that holds the processor handle.
        let _serial = self.sync_lock.lock();
        let mut workers = self.workers.lock();
        if let Some(handle) = workers.processor.take() {
            let pool = join_processor(handle);
            debug!(target: "kvrelay::dispatch", connections = ?pool, "command processor joined");
        }
        self.finish(&mut workers);
    }

    /// True while the command processor is running.
    pub fn is_active(&self) -> bool {
        *self.active.read()
    }

    /// Activity counters.
    pub fn stats(&self) -> DispatchStats {
        self.shared.stats()
    }

    /// Endpoints that produced a connection at construction, in order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Tuning this dispatcher was built with.
    pub fn tuning(&self) -> Tuning {
        self.shared.tuning
    }

    fn submit(&self, command: Command) -> bool {
        let active = self.active.read();
        if !*active {
            return false;
        }
        self.shared.commands.enqueue(command)
    }

    /// Set the processor's exit mode and wake whatever it is waiting on.
    /// Called with the `active` write lock held.
    fn signal_stop(&self, stop_now: bool) {
        if stop_now {
            self.shared.mode.set(ExecutorMode::StopImmediately);
            self.shared.from_reconnect.close();
        } else {
            self.shared.mode.set(ExecutorMode::DrainAndStop);
        }
        self.shared.commands.close();
    }

    fn finish(&self, workers: &mut Workers) {
        workers.token.cancel();
        self.shared.to_reconnect.close();
        if let Some(handle) = workers.reconnector.take() {
            if handle.join().is_err() {
                error!(target: "kvrelay::dispatch", "reconnection manager panicked");
            }
        }

        // Releases GET callers whose commands will never run.
        let discarded = self.shared.commands.clear();
        if discarded > 0 {
            debug!(target: "kvrelay::dispatch", discarded, "discarded queued commands");
        }
        info!(target: "kvrelay::dispatch", "dispatcher stopped");
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop(true);
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoints", &self.endpoints)
            .field("active", &self.is_active())
            .field("stats", &self.stats())
            .finish()
    }
}

fn spawn_processor(shared: &Arc<Shared>, pool: ConnectionPool) -> Result<JoinHandle<ConnectionPool>> {
    let shared = Arc::clone(shared);
    thread::Builder::new()
        .name(PROCESSOR_THREAD.to_string())
        .spawn(move || processor::run(&shared, pool))
        .map_err(|source| Error::Spawn {
            thread: PROCESSOR_THREAD.to_string(),
            source,
        })
}

fn spawn_reconnector(shared: &Arc<Shared>, token: &StopToken) -> Result<JoinHandle<()>> {
    let shared = Arc::clone(shared);
    let token = token.clone();
    thread::Builder::new()
        .name(RECONNECT_THREAD.to_string())
        .spawn(move || reconnector::run(&shared, &token))
        .map_err(|source| Error::Spawn {
            thread: RECONNECT_THREAD.to_string(),
            source,
        })
}

fn join_processor(handle: JoinHandle<ConnectionPool>) -> ConnectionPool {
    handle.join().unwrap_or_else(|_| {
        error!(target: "kvrelay::dispatch", "command processor panicked, connection pool lost");
        ConnectionPool::new()
    })
}
