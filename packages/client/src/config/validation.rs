//! Configuration validation

use http::{HeaderName, HeaderValue};

use super::Config;
use crate::error::{self, Result};

impl Config {
    /// Check the invariants a pool and request builder rely on.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - `pool_maxsize` or `pool_connections` is zero
    /// - a base header name or value cannot be sent on the wire
    pub fn validate(&self) -> Result<()> {
        if self.settings.pool_maxsize == 0 {
            return Err(error::config("pool_maxsize must be at least 1"));
        }
        if self.settings.pool_connections == 0 {
            return Err(error::config("pool_connections must be at least 1"));
        }

        for (name, value) in &self.base_headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| error::config(format!("invalid base header name `{name}`")))?;
            HeaderValue::from_str(value)
                .map_err(|_| error::config(format!("invalid value for base header `{name}`")))?;
        }

        Ok(())
    }
}
