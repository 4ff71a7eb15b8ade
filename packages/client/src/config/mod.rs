//! Session configuration
//!
//! A [`Config`] is an immutable record of the options that shape a session:
//! redirect and retry budgets, pool sizing, error-surfacing modes and the
//! headers sent with every request. Per-call overrides go through
//! [`Config::resolve`], which derives a new value and never touches the
//! shared defaults.

use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod overrides;
pub mod serialization;
pub mod validation;

pub use defaults::{default_user_agent, SCHEMES};

/// Immutable client configuration.
///
/// Built from [`Config::defaults`] plus overrides; there are no setters.
/// Serializes to a flat JSON object and deserializes back, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) settings: Settings,
    pub(crate) base_headers: Vec<(String, String)>,
}

/// Scalar options. Field names are the override keys accepted by [`Config::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) max_redirects: usize,
    pub(crate) max_retries: u32,
    pub(crate) pool_connections: usize,
    pub(crate) pool_maxsize: usize,
    pub(crate) keep_alive: bool,
    pub(crate) strict_mode: bool,
    pub(crate) danger_mode: bool,
    pub(crate) safe_mode: bool,
    pub(crate) trust_env: bool,
    pub(crate) store_cookies: bool,
    pub(crate) encode_uri: bool,
    pub(crate) verbose: bool,
}

impl Config {
    /// Maximum number of redirects followed within one request.
    #[inline]
    #[must_use]
    pub fn max_redirects(&self) -> usize {
        self.settings.max_redirects
    }

    /// Number of times a connection-level failure is re-attempted.
    #[inline]
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.settings.max_retries
    }

    /// Number of distinct destinations the pool keeps connections for.
    #[inline]
    #[must_use]
    pub fn pool_connections(&self) -> usize {
        self.settings.pool_connections
    }

    /// Maximum connections per destination, idle and lent combined.
    #[inline]
    #[must_use]
    pub fn pool_maxsize(&self) -> usize {
        self.settings.pool_maxsize
    }

    #[inline]
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        self.settings.keep_alive
    }

    /// Preserve method and body on 301/302/303 redirects.
    #[inline]
    #[must_use]
    pub fn strict_mode(&self) -> bool {
        self.settings.strict_mode
    }

    /// Surface every failure and bad status immediately; never wait on the pool.
    #[inline]
    #[must_use]
    pub fn danger_mode(&self) -> bool {
        self.settings.danger_mode
    }

    /// Convert failures into responses carrying the error.
    #[inline]
    #[must_use]
    pub fn safe_mode(&self) -> bool {
        self.settings.safe_mode
    }

    /// Read proxy settings from the environment.
    #[inline]
    #[must_use]
    pub fn trust_env(&self) -> bool {
        self.settings.trust_env
    }

    #[inline]
    #[must_use]
    pub fn store_cookies(&self) -> bool {
        self.settings.store_cookies
    }

    /// Form-encode query parameters instead of appending them verbatim.
    #[inline]
    #[must_use]
    pub fn encode_uri(&self) -> bool {
        self.settings.encode_uri
    }

    /// Log every send at `info` instead of `debug`.
    #[inline]
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.settings.verbose
    }

    /// Headers sent with every request, in the order they go on the wire.
    #[must_use]
    pub fn base_headers(&self) -> &[(String, String)] {
        &self.base_headers
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults().clone()
    }
}
