use std::fmt;
use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::HeaderValue;

use super::BasicAuth;
use crate::error::{self, Result};
use crate::http::HeaderList;

/// Writes credentials into an outgoing request.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to headers
    ///
    /// # Errors
    ///
    /// Returns an error when the credentials cannot be expressed as headers.
    fn apply(&self, headers: &mut HeaderList) -> Result<()>;

    /// Get authentication method name
    fn auth_type(&self) -> &'static str;
}

/// Bearer token authentication
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl AuthProvider for BearerToken {
    fn apply(&self, headers: &mut HeaderList) -> Result<()> {
        if self.token.is_empty() {
            return Ok(());
        }
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(error::invalid_header)?;
        value.set_sensitive(true);
        headers.set(AUTHORIZATION, value);
        Ok(())
    }

    fn auth_type(&self) -> &'static str {
        "Bearer"
    }
}

/// Shareable authentication attached to a session or a single request.
#[derive(Clone)]
pub struct Auth(Arc<dyn AuthProvider>);

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::custom(BasicAuth::new(username, Some(password.into())))
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::custom(BearerToken::new(token))
    }

    pub fn custom<P: AuthProvider + 'static>(provider: P) -> Self {
        Self(Arc::new(provider))
    }

    pub(crate) fn apply(&self, headers: &mut HeaderList) -> Result<()> {
        self.0.apply(headers)
    }

    #[must_use]
    pub fn auth_type(&self) -> &'static str {
        self.0.auth_type()
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Auth").field(&self.0.auth_type()).finish()
    }
}
