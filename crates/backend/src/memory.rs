//! In-memory backend with fault injection.
//!
//! A [`MemoryStore`] plays the role of the remote key-value service. Every
//! endpoint handed out by a [`MemoryConnector`] talks to the same store but
//! has its own [`FaultHandle`], so a test can take one endpoint offline, make
//! the next few operations fail, or hold operations at a gate, while the
//! others keep working.

use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use kvrelay_core::{Connection, Connector, Endpoint, Error, Result, Status};
use tracing::debug;

/// Shared key-value map standing in for the remote service.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, String>>>,
    writes: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a value directly, bypassing any connection.
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    /// Write a value directly, bypassing any connection.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().insert(key.into(), value.into());
    }

    /// True if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True when no key is stored.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Number of PUT and DELETE operations applied through connections.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn apply_put(&self, key: &str, value: &str) {
        self.data.write().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn apply_delete(&self, key: &str) -> bool {
        let existed = self.data.write().remove(key).is_some();
        self.writes.fetch_add(1, Ordering::SeqCst);
        existed
    }
}

#[derive(Default)]
struct FaultState {
    offline: AtomicBool,
    fail_next: AtomicUsize,
    held: Mutex<bool>,
    released: Condvar,
    operations: AtomicU64,
    failures: AtomicU64,
    reconnect_attempts: AtomicU64,
    reconnects: AtomicU64,
}

/// Fault controls and counters for one endpoint.
///
/// Clones share state with the connections created for the endpoint.
#[derive(Clone, Default)]
pub struct FaultHandle {
    state: Arc<FaultState>,
}

impl FaultHandle {
    /// Take the endpoint offline (`false`) or bring it back (`true`).
    ///
    /// While offline every operation reports a transport failure and every
    /// reconnect attempt fails.
    pub fn set_online(&self, online: bool) {
        self.state.offline.store(!online, Ordering::SeqCst);
    }

    /// True unless the endpoint was taken offline.
    pub fn is_online(&self) -> bool {
        !self.state.offline.load(Ordering::SeqCst)
    }

    /// Make the next `count` operations report a transport failure.
    pub fn fail_next(&self, count: usize) {
        self.state.fail_next.store(count, Ordering::SeqCst);
    }

    /// Block operations at a gate until [`release`](Self::release).
    pub fn hold(&self) {
        *self.state.held.lock() = true;
    }

    /// Open the gate closed by [`hold`](Self::hold).
    pub fn release(&self) {
        let mut held = self.state.held.lock();
        *held = false;
        self.state.released.notify_all();
    }

    /// Operations attempted on this endpoint, including failed ones.
    pub fn operations(&self) -> u64 {
        self.state.operations.load(Ordering::SeqCst)
    }

    /// Operations that reported a transport failure.
    pub fn failures(&self) -> u64 {
        self.state.failures.load(Ordering::SeqCst)
    }

    /// Reconnect attempts, successful or not.
    pub fn reconnect_attempts(&self) -> u64 {
        self.state.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Successful reconnects.
    pub fn reconnects(&self) -> u64 {
        self.state.reconnects.load(Ordering::SeqCst)
    }

    /// Gate, count and possibly fail one operation.
    fn admit(&self) -> Option<Status> {
        {
            let mut held = self.state.held.lock();
            while *held {
                self.state.released.wait(&mut held);
            }
        }
        self.state.operations.fetch_add(1, Ordering::SeqCst);
        if self.state.offline.load(Ordering::SeqCst) {
            self.state.failures.fetch_add(1, Ordering::SeqCst);
            return Some(Status::Transport("endpoint offline".to_string()));
        }
        let injected = self
            .state
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            self.state.failures.fetch_add(1, Ordering::SeqCst);
            return Some(Status::Transport("injected failure".to_string()));
        }
        None
    }
}

/// Connector producing [`MemoryConnection`]s over one shared store.
#[derive(Default)]
pub struct MemoryConnector {
    store: MemoryStore,
    faults: Mutex<HashMap<Endpoint, FaultHandle>>,
    unreachable: Mutex<HashSet<Endpoint>>,
}

impl MemoryConnector {
    /// Create a connector over `store`.
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            faults: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(HashSet::new()),
        }
    }

    /// The store every connection writes to.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Fault controls for `endpoint`, created on first use.
    pub fn faults(&self, endpoint: &Endpoint) -> FaultHandle {
        self.faults.lock().entry(endpoint.clone()).or_default().clone()
    }

    /// Refuse future `connect` calls for `endpoint`.
    pub fn mark_unreachable(&self, endpoint: &Endpoint) {
        self.unreachable.lock().insert(endpoint.clone());
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>> {
        if self.unreachable.lock().contains(endpoint) {
            return Err(Error::connect(endpoint, "connection refused"));
        }
        debug!(target: "kvrelay::backend", endpoint = %endpoint, "memory connection opened");
        Ok(Box::new(MemoryConnection {
            endpoint: endpoint.clone(),
            store: self.store.clone(),
            faults: self.faults(endpoint),
        }))
    }
}

/// Connection to a [`MemoryStore`] through one endpoint's fault controls.
pub struct MemoryConnection {
    endpoint: Endpoint,
    store: MemoryStore,
    faults: FaultHandle,
}

impl MemoryConnection {
    /// Fault controls of this connection's endpoint.
    pub fn faults(&self) -> &FaultHandle {
        &self.faults
    }
}

impl Connection for MemoryConnection {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn put(&mut self, key: &str, value: &str) -> Status {
        if let Some(failure) = self.faults.admit() {
            return failure;
        }
        self.store.apply_put(key, value);
        Status::Ok
    }

    fn get(&mut self, key: &str) -> (Status, Option<String>) {
        if let Some(failure) = self.faults.admit() {
            return (failure, None);
        }
        match self.store.get(key) {
            Some(value) => (Status::Ok, Some(value)),
            None => (Status::NotFound, None),
        }
    }

    fn delete(&mut self, key: &str) -> Status {
        if let Some(failure) = self.faults.admit() {
            return failure;
        }
        if self.store.apply_delete(key) {
            Status::Ok
        } else {
            Status::NotFound
        }
    }

    fn reconnect(&mut self) -> bool {
        let state = &self.faults.state;
        state.reconnect_attempts.fetch_add(1, Ordering::SeqCst);
        if state.offline.load(Ordering::SeqCst) {
            return false;
        }
        state.reconnects.fetch_add(1, Ordering::SeqCst);
        true
    }
}
