use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tracing::Instrument;

use super::builder::SessionBuilder;
use super::dispatch::Dispatch;
use super::options::RequestOptions;
use super::stats::{SessionCounters, SessionStats};
use crate::auth::Auth;
use crate::config::Config;
use crate::cookie::Jar;
use crate::error::{self, Error, Result};
use crate::http::{target, HeaderList, Method, Response};
use crate::pool::{ConnectionPool, PoolLimits};
use crate::proxy::Environment;
use crate::transport::Transport;

/// Stateful client context: pooled connections, cookies and configuration.
///
/// Clones share the same state. Closing any clone closes the session for all
/// of them.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

#[derive(Debug)]
pub(crate) struct SessionInner {
    pub(crate) config: Config,
    pub(crate) pool: ConnectionPool,
    pub(crate) jar: Jar,
    pub(crate) headers: HeaderList,
    pub(crate) auth: Option<Auth>,
    pub(crate) proxies: Vec<(String, String)>,
    pub(crate) environment: Arc<dyn Environment>,
    pub(crate) counters: SessionCounters,
    closed: AtomicBool,
}

impl SessionInner {
    pub(crate) fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        headers: HeaderList,
        auth: Option<Auth>,
        proxies: Vec<(String, String)>,
        environment: Arc<dyn Environment>,
    ) -> Self {
        let pool = ConnectionPool::new(transport, PoolLimits::from_config(&config));
        Self {
            config,
            pool,
            jar: Jar::new(),
            headers,
            auth,
            proxies,
            environment,
            counters: SessionCounters::default(),
            closed: AtomicBool::new(false),
        }
    }
}

impl Session {
    /// Session with the default configuration and the shared transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self::with_transport(config, crate::global_transport())
    }

    /// Session over a custom transport.
    #[must_use]
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        SessionBuilder::new()
            .config(config)
            .transport(transport)
            .assemble(HeaderList::new())
    }

    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    #[inline]
    #[must_use]
    pub fn cookies(&self) -> &Jar {
        &self.inner.jar
    }

    /// Headers added to every request of this session.
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderList {
        &self.inner.headers
    }

    #[inline]
    #[must_use]
    pub fn pool(&self) -> &ConnectionPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.inner.counters.snapshot()
    }

    /// Send a request and follow it through redirects and retries.
    ///
    /// Per-call `config` overrides are resolved against the session config;
    /// `options.session` is ignored here.
    ///
    /// # Errors
    ///
    /// - [`crate::Kind::SessionClosed`] once [`Session::close`] was called
    /// - [`crate::Kind::Config`] and [`crate::Kind::InvalidRequest`] from the build step
    /// - transport, pool and redirect errors from dispatch, after retries
    /// - [`crate::Kind::Status`] for 4xx/5xx responses in `danger_mode`
    ///
    /// Every error carries the method and URL, except when the URL does not
    /// parse at all, plus the number of attempts once anything was sent.
    pub async fn request(
        &self,
        method: Method,
        url: impl AsRef<str>,
        options: RequestOptions,
    ) -> Result<Response> {
        let early = target::context_url(url.as_ref());
        let with_context = |err: Error| match &early {
            Some(url) => err.with_request(method, url),
            None => err,
        };
        if self.is_closed() {
            return Err(with_context(error::session_closed()));
        }
        let inner = &*self.inner;
        inner.counters.record_request();

        let built = inner
            .config
            .resolve(options.config_overrides())
            .and_then(|config| {
                let prepared = self.prepare_with(method, url.as_ref(), &options, &config)?;
                Ok((config, prepared))
            });
        let (config, prepared) = match built {
            Ok(built) => built,
            Err(err) => {
                inner.counters.record_failure();
                return Err(with_context(err));
            }
        };
        let request = prepared.request.clone();

        let sends = AtomicU32::new(0);
        let dispatch = Dispatch {
            inner,
            config: &config,
            allow_redirects: options.allow_redirects_for(method),
            origin: request.url().clone(),
            cookies: prepared.cookies,
            proxies: prepared.proxies,
            sends: &sends,
        };

        let span = tracing::debug_span!("request", method = %method, url = %request.url());
        let run = dispatch.run(prepared.request).instrument(span);
        let outcome = match request.timeout() {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or_else(|_| {
                    Err(error::timeout(format!(
                        "request did not complete within {limit:?}"
                    )))
                }),
            None => run.await,
        };

        let outcome = outcome.and_then(|response| {
            if config.danger_mode() {
                response.error_for_status()
            } else {
                Ok(response)
            }
        });

        outcome.map_err(|err| {
            inner.counters.record_failure();
            let err = err.with_request(method, request.url());
            let sent = sends.load(Ordering::Relaxed);
            if err.attempts() == 0 && sent > 0 {
                err.with_attempts(sent)
            } else {
                err
            }
        })
    }

    pub async fn get(&self, url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
        self.request(Method::Get, url, options).await
    }

    pub async fn options(&self, url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
        self.request(Method::Options, url, options).await
    }

    /// Redirects are not followed unless `allow_redirects` is set.
    pub async fn head(&self, url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
        self.request(Method::Head, url, options).await
    }

    pub async fn post(&self, url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
        self.request(Method::Post, url, options).await
    }

    pub async fn put(&self, url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
        self.request(Method::Put, url, options).await
    }

    pub async fn patch(&self, url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
        self.request(Method::Patch, url, options).await
    }

    pub async fn delete(&self, url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
        self.request(Method::Delete, url, options).await
    }

    /// Close pooled connections and refuse further requests.
    ///
    /// Requests in flight fail at their next connection checkout; their
    /// current connections are closed when returned. Closing twice is a no-op.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("closing session");
        self.inner.pool.close_all();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
