use std::sync::Arc;

use serde_json::{Map, Value};

use super::core::{Session, SessionInner};
use crate::auth::Auth;
use crate::config::Config;
use crate::error::Result;
use crate::http::HeaderList;
use crate::proxy::{Environment, SystemEnvironment};
use crate::transport::Transport;

/// Builder for sessions with default headers, auth, proxies or a custom transport.
#[derive(Debug, Default)]
pub struct SessionBuilder {
    config: Option<Config>,
    overrides: Map<String, Value>,
    transport: Option<Arc<dyn Transport>>,
    headers: Vec<(String, String)>,
    auth: Option<Auth>,
    proxies: Vec<(String, String)>,
    environment: Option<Arc<dyn Environment>>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Base configuration; defaults to [`Config::defaults`].
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Override one configuration key on top of the base configuration.
    #[must_use]
    pub fn config_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Header sent with every request, above the configured base headers.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Several headers at once, in order.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(pairs.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// Auth used when a request carries none of its own.
    #[must_use]
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Session-wide proxy for a URL scheme or `"all"`; per-call proxies win.
    #[must_use]
    pub fn proxy(mut self, scheme: impl Into<String>, proxy: impl Into<String>) -> Self {
        self.proxies.push((scheme.into(), proxy.into()));
        self
    }

    /// Where `trust_env` reads proxy variables from; the process environment by default.
    #[must_use]
    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// # Errors
    ///
    /// Fails when a configuration override is unknown or mistyped, or a
    /// header is not valid on the wire.
    pub fn build(mut self) -> Result<Session> {
        let base = self.config.take().unwrap_or_default();
        let config = base.resolve(&self.overrides)?;
        let headers = HeaderList::from_pairs(
            self.headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )?;
        self.config = Some(config);
        Ok(self.assemble(headers))
    }

    pub(crate) fn assemble(self, headers: HeaderList) -> Session {
        let config = self.config.unwrap_or_default();
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => crate::global_transport(),
        };
        let environment: Arc<dyn Environment> = match self.environment {
            Some(environment) => environment,
            None => Arc::new(SystemEnvironment),
        };

        tracing::debug!(
            max_redirects = config.max_redirects(),
            max_retries = config.max_retries(),
            pool_connections = config.pool_connections(),
            pool_maxsize = config.pool_maxsize(),
            "creating session"
        );

        Session {
            inner: Arc::new(SessionInner::new(
                config,
                transport,
                headers,
                self.auth,
                self.proxies,
                environment,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_overrides_and_headers() {
        let session = SessionBuilder::new()
            .config_value("max_redirects", 3)
            .header("X-Client", "tests")
            .build()
            .expect("session should build");
        assert_eq!(session.config().max_redirects(), 3);
        assert_eq!(session.headers().get_str("x-client"), Some("tests"));
        assert_eq!(session.pool().limits().max_per_key, 10);
    }

    #[test]
    fn builder_rejects_unknown_keys() {
        let err = SessionBuilder::new()
            .config_value("max_redirect", 3)
            .build()
            .expect_err("typo in key");
        assert!(err.is_config());
    }

    #[test]
    fn builder_rejects_bad_headers() {
        let err = SessionBuilder::new()
            .header("Bad Header", "x")
            .build()
            .expect_err("space in header name");
        assert!(err.is_invalid_request());
    }
}
