use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use super::{PoolKey, Shared};
use crate::transport::{Connection, TransportError};

/// A connection lent out by the pool.
///
/// Hand it back with [`release`](Self::release) or drop it for good with
/// [`discard`](Self::discard). Dropping the guard without either closes the
/// connection and frees its slot, which is what happens when a timed-out
/// request future is cancelled mid-exchange.
pub struct PooledConnection {
    shared: Arc<Shared>,
    key: PoolKey,
    connection: Option<Box<dyn Connection>>,
    reused: bool,
}

impl PooledConnection {
    pub(super) fn new(
        shared: Arc<Shared>,
        key: PoolKey,
        connection: Box<dyn Connection>,
        reused: bool,
    ) -> Self {
        Self {
            shared,
            key,
            connection: Some(connection),
            reused,
        }
    }

    #[must_use]
    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Whether the connection came from the idle set.
    #[must_use]
    pub fn is_reused(&self) -> bool {
        self.reused
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| connection.is_healthy())
    }

    /// Send `request` and read its response.
    ///
    /// # Errors
    ///
    /// Whatever the connection reports; the guard should then be discarded.
    pub async fn exchange(
        &mut self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| TransportError::reset("connection already returned to the pool"))?;
        connection.send(request).await?;
        connection.recv().await
    }

    /// Return the connection to the pool.
    pub fn release(mut self) {
        if let Some(connection) = self.connection.take() {
            self.shared.checkin(&self.key, connection);
        }
    }

    /// Close the connection instead of returning it.
    pub fn discard(mut self) {
        self.close_and_free();
    }

    fn close_and_free(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            self.shared.free_slot(&self.key);
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if self.connection.is_some() {
            tracing::trace!(key = %self.key, "dropping lent connection without release");
            self.close_and_free();
        }
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("key", &self.key)
            .field("reused", &self.reused)
            .field("connection", &self.connection)
            .finish()
    }
}
