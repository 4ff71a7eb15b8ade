//! Connection pool
//!
//! Keyed cache of transport connections. For every [`PoolKey`] the pool
//! tracks idle connections and the number of slots currently lent out (or
//! reserved by a connect in progress):
//!
//! - `idle + lent <= max_per_key` for every key, so a connection is never
//!   created past `pool_maxsize` and never lent twice;
//! - at most `max_keys` keys exist; a new key evicts the least recently used
//!   key that has nothing lent, closing its idle connections;
//! - when no slot is free, `acquire` waits for a release, or fails at once
//!   with [`PoolError::Exhausted`] when the pool does not block.
//!
//! All bookkeeping sits behind one mutex that is never held across an
//! `.await`; connecting happens outside it on a reserved slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

pub mod guard;
pub mod key;

pub use guard::PooledConnection;
pub use key::{PoolKey, ProxyEndpoint, Scheme};

use crate::config::Config;
use crate::error::{self, Error};
use crate::transport::{Connection, Transport, TransportError};

/// Capacity policy of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    /// Distinct keys kept (`pool_connections`).
    pub max_keys: usize,
    /// Idle plus lent connections per key (`pool_maxsize`).
    pub max_per_key: usize,
    /// Return healthy connections to the idle set after use.
    pub keep_alive: bool,
    /// Wait for a free slot instead of failing.
    pub block: bool,
}

impl PoolLimits {
    /// Limits of a session built with `config`; `danger_mode` disables blocking.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_keys: config.pool_connections(),
            max_per_key: config.pool_maxsize(),
            keep_alive: config.keep_alive(),
            block: !config.danger_mode(),
        }
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub keys: usize,
    pub idle: usize,
    pub lent: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("no connection available for {key} within the pool limits")]
    Exhausted { key: PoolKey },

    #[error("connection pool is closed")]
    Closed,

    #[error(transparent)]
    Connect(#[from] TransportError),
}

impl From<PoolError> for Error {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted { .. } => error::pool_exhausted(err),
            PoolError::Closed => error::session_closed(),
            PoolError::Connect(err) => err.into(),
        }
    }
}

/// Pool handle; clones share the same connections.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    transport: Arc<dyn Transport>,
    limits: PoolLimits,
    state: Mutex<PoolState>,
    released: Notify,
}

#[derive(Debug, Default)]
struct PoolState {
    closed: bool,
    clock: u64,
    hosts: HashMap<PoolKey, HostEntry>,
}

#[derive(Debug, Default)]
struct HostEntry {
    idle: Vec<Box<dyn Connection>>,
    lent: usize,
    last_used: u64,
}

impl HostEntry {
    fn is_empty(&self) -> bool {
        self.idle.is_empty() && self.lent == 0
    }
}

enum Checkout {
    Reused(Box<dyn Connection>),
    Reserved,
    Exhausted,
    Closed,
}

impl ConnectionPool {
    pub fn new(transport: Arc<dyn Transport>, limits: PoolLimits) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                limits,
                state: Mutex::new(PoolState::default()),
                released: Notify::new(),
            }),
        }
    }

    #[must_use]
    pub fn limits(&self) -> PoolLimits {
        self.shared.limits
    }

    /// Get a connection for `key`: a healthy idle one, or a new one if the
    /// limits allow, or (when blocking) the next one released.
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] when no slot is free and the pool does not
    /// block, [`PoolError::Closed`] after [`ConnectionPool::close_all`], and
    /// [`PoolError::Connect`] when the transport fails to connect.
    pub async fn acquire(&self, key: &PoolKey) -> Result<PooledConnection, PoolError> {
        loop {
            // Registered before checking out so a release in between is not missed.
            let released = self.shared.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            match self.shared.checkout(key) {
                Checkout::Reused(connection) => {
                    tracing::trace!(%key, "reusing idle connection");
                    return Ok(PooledConnection::new(self.shared.clone(), key.clone(), connection, true));
                }
                Checkout::Reserved => return self.connect(key).await,
                Checkout::Closed => return Err(PoolError::Closed),
                Checkout::Exhausted if !self.shared.limits.block => {
                    return Err(PoolError::Exhausted { key: key.clone() })
                }
                Checkout::Exhausted => {
                    tracing::trace!(%key, "pool full, waiting for a release");
                    released.await;
                }
            }
        }
    }

    async fn connect(&self, key: &PoolKey) -> Result<PooledConnection, PoolError> {
        let reservation = Reservation {
            shared: &self.shared,
            key,
            armed: true,
        };
        let connection = self.shared.transport.connect(key).await?;
        reservation.disarm();
        tracing::debug!(%key, "opened new connection");
        Ok(PooledConnection::new(self.shared.clone(), key.clone(), connection, false))
    }

    /// Close every idle connection and refuse further checkouts.
    ///
    /// Lent connections are closed when they come back. Waiters wake up and
    /// fail with [`PoolError::Closed`]. Calling this again does nothing.
    pub fn close_all(&self) {
        let drained: Vec<Box<dyn Connection>> = {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state
                .hosts
                .values_mut()
                .flat_map(|entry| entry.idle.drain(..))
                .collect()
        };

        tracing::debug!(closed = drained.len(), "closing connection pool");
        for mut connection in drained {
            connection.close();
        }
        self.shared.released.notify_waiters();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.lock();
        state
            .hosts
            .values()
            .fold(PoolStats::default(), |mut stats, entry| {
                stats.keys += 1;
                stats.idle += entry.idle.len();
                stats.lent += entry.lent;
                stats
            })
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checkout(&self, key: &PoolKey) -> Checkout {
        let mut stale = Vec::new();
        let outcome = {
            let mut state = self.lock();
            self.checkout_locked(&mut state, key, &mut stale)
        };
        for mut connection in stale {
            connection.close();
        }
        outcome
    }

    fn checkout_locked(
        &self,
        state: &mut PoolState,
        key: &PoolKey,
        stale: &mut Vec<Box<dyn Connection>>,
    ) -> Checkout {
        if state.closed {
            return Checkout::Closed;
        }
        state.clock += 1;
        let now = state.clock;

        if !state.hosts.contains_key(key) {
            if state.hosts.len() >= self.limits.max_keys {
                match evict_lru(state) {
                    Some((evicted, idle)) => {
                        tracing::debug!(%evicted, for_key = %key, "evicted least recently used key");
                        stale.extend(idle);
                    }
                    None => return Checkout::Exhausted,
                }
            }
            state.hosts.insert(key.clone(), HostEntry::default());
        }

        let Some(entry) = state.hosts.get_mut(key) else {
            return Checkout::Exhausted;
        };
        entry.last_used = now;

        while let Some(connection) = entry.idle.pop() {
            if connection.is_healthy() {
                entry.lent += 1;
                return Checkout::Reused(connection);
            }
            stale.push(connection);
        }

        if entry.idle.len() + entry.lent < self.limits.max_per_key {
            entry.lent += 1;
            Checkout::Reserved
        } else {
            Checkout::Exhausted
        }
    }

    /// Take back a lent connection, keeping it idle when allowed.
    fn checkin(&self, key: &PoolKey, mut connection: Box<dyn Connection>) {
        let rejected = {
            let mut state = self.lock();
            let keep = !state.closed && self.limits.keep_alive && connection.is_healthy();
            match state.hosts.get_mut(key) {
                Some(entry) => {
                    entry.lent = entry.lent.saturating_sub(1);
                    if keep && entry.idle.len() + entry.lent < self.limits.max_per_key {
                        entry.idle.push(connection);
                        None
                    } else {
                        if entry.is_empty() {
                            state.hosts.remove(key);
                        }
                        Some(connection)
                    }
                }
                None => Some(connection),
            }
        };

        match rejected {
            Some(mut connection) => {
                tracing::trace!(%key, "closing returned connection");
                connection.close();
            }
            None => tracing::trace!(%key, "connection returned to idle set"),
        }
        self.released.notify_waiters();
    }

    /// Give back a slot whose connection is gone (closed or never opened).
    fn free_slot(&self, key: &PoolKey) {
        {
            let mut state = self.lock();
            if let Some(entry) = state.hosts.get_mut(key) {
                entry.lent = entry.lent.saturating_sub(1);
                if entry.is_empty() {
                    state.hosts.remove(key);
                }
            }
        }
        self.released.notify_waiters();
    }
}

/// Remove the least recently used key with nothing lent out.
fn evict_lru(state: &mut PoolState) -> Option<(PoolKey, Vec<Box<dyn Connection>>)> {
    let victim = state
        .hosts
        .iter()
        .filter(|(_, entry)| entry.lent == 0)
        .min_by_key(|(_, entry)| entry.last_used)
        .map(|(key, _)| key.clone())?;
    let entry = state.hosts.remove(&victim)?;
    Some((victim, entry.idle))
}

/// A slot reserved for a connect in progress; freed unless disarmed.
struct Reservation<'a> {
    shared: &'a Shared,
    key: &'a PoolKey,
    armed: bool,
}

impl Reservation<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.free_slot(self.key);
        }
    }
}
