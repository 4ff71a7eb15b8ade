//! Dispatch step: send a prepared request, retry transport failures and
//! follow redirects until a final response.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use http::header::COOKIE;
use url::Url;

use super::core::SessionInner;
use super::prepare::cookie_header;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{compression, target, Request, Response};
use crate::pool::{PoolError, PoolKey, PooledConnection};
use crate::redirect::{RedirectAction, RedirectResolver};
use crate::retry::{RetryDecision, RetryPolicy};

/// One logical request in flight.
pub(crate) struct Dispatch<'a> {
    pub(crate) inner: &'a SessionInner,
    pub(crate) config: &'a Config,
    pub(crate) allow_redirects: bool,
    /// URL of the first hop; explicit cookies only go back to its host.
    pub(crate) origin: Url,
    pub(crate) cookies: Vec<(String, String)>,
    pub(crate) proxies: Vec<(String, String)>,
    /// Send attempts over the whole chain, read back when the request fails.
    pub(crate) sends: &'a AtomicU32,
}

impl Dispatch<'_> {
    pub(crate) async fn run(&self, first: Request) -> Result<Response> {
        let resolver = RedirectResolver::from_config(self.config);
        let mut remaining = resolver.max_redirects();
        let mut history = Vec::new();
        let mut held: Option<PooledConnection> = None;
        let mut request = first;

        loop {
            let (response, connection) = self.send(&request, held.take()).await?;
            if self.config.store_cookies() {
                self.inner.jar.store_response(response.headers(), request.url());
            }
            let connection = if response.closes_connection() {
                tracing::trace!(key = %connection.key(), "server closes the connection");
                connection.discard();
                None
            } else {
                Some(connection)
            };

            if !self.allow_redirects {
                release(connection);
                return Ok(response.with_history(history));
            }

            let action = match resolver.resolve(&request, &response, remaining) {
                Ok(action) => action,
                Err(err) => {
                    release(connection);
                    return Err(err);
                }
            };
            match action {
                RedirectAction::Continue { next, remaining: left } => {
                    let next = match self.next_hop(next) {
                        Ok(next) => next,
                        Err(err) => {
                            release(connection);
                            return Err(err);
                        }
                    };
                    remaining = left;
                    held = connection;
                    history.push(response);
                    self.inner.counters.record_redirect();
                    request = next;
                }
                RedirectAction::Stop(reason) => {
                    if response.is_redirect() {
                        tracing::debug!(?reason, url = %request.url(), "not following redirect");
                    }
                    release(connection);
                    return Ok(response.with_history(history));
                }
            }
        }
    }

    /// Proxy and `Cookie` header of a redirect hop, recomputed for its URL.
    fn next_hop(&self, next: Request) -> Result<Request> {
        let proxy = self.inner.select_proxy(next.url(), &self.proxies, self.config)?;
        let include_explicit = target::same_host(&self.origin, next.url());

        let mut headers = next.headers().clone();
        headers.remove(COOKIE);
        let cookie = cookie_header(&self.inner.jar, next.url(), &self.cookies, include_explicit);
        if let Some(cookie) = cookie {
            headers.try_set(COOKIE.as_str(), &cookie)?;
        }
        Ok(next.with_proxy(proxy).with_headers(headers))
    }

    /// Send one hop, retrying failures the policy allows.
    ///
    /// `held` is the connection of the previous hop; it is used again when it
    /// leads to the same pool key and is released otherwise.
    async fn send(
        &self,
        request: &Request,
        mut held: Option<PooledConnection>,
    ) -> Result<(Response, PooledConnection)> {
        let key = PoolKey::for_request(request)?;
        let retry = RetryPolicy::from_config(self.config);
        let mut attempt = 0u32;

        loop {
            let wire = request.to_wire()?;
            attempt += 1;
            self.sends.fetch_add(1, Ordering::Relaxed);
            self.inner.counters.record_send();

            let reusable = match held.take() {
                Some(connection) if connection.key() == &key && connection.is_healthy() => {
                    Some(connection)
                }
                Some(connection) => {
                    connection.release();
                    None
                }
                None => None,
            };
            let mut connection = match reusable {
                Some(connection) => connection,
                None => match self.inner.pool.acquire(&key).await {
                    Ok(connection) => connection,
                    Err(PoolError::Connect(failure)) => match retry.decide(attempt, failure) {
                        RetryDecision::Retry => {
                            self.inner.counters.record_retry();
                            continue;
                        }
                        RetryDecision::GiveUp(err) => {
                            return Err(err.with_request(request.method(), request.url()))
                        }
                    },
                    Err(err) => {
                        return Err(Error::from(err)
                            .with_request(request.method(), request.url())
                            .with_attempts(attempt))
                    }
                },
            };

            let reused = connection.is_reused();
            if self.config.verbose() {
                tracing::info!(
                    method = %request.method(),
                    url = %request.url(),
                    attempt,
                    reused,
                    "sending request"
                );
            } else {
                tracing::debug!(
                    method = %request.method(),
                    url = %request.url(),
                    attempt,
                    reused,
                    "sending request"
                );
            }

            let started = Instant::now();
            match connection.exchange(wire).await {
                Ok(wire) => {
                    let wire = match compression::decode(wire) {
                        Ok(wire) => wire,
                        Err(err) => {
                            connection.discard();
                            return Err(err
                                .with_request(request.method(), request.url())
                                .with_attempts(attempt));
                        }
                    };
                    let response = Response::from_wire(wire, request.clone(), started.elapsed());
                    tracing::debug!(
                        status = response.status().map(|status| status.as_u16()),
                        elapsed = ?response.elapsed(),
                        "received response"
                    );
                    return Ok((response, connection));
                }
                Err(failure) => {
                    connection.discard();
                    match retry.decide(attempt, failure) {
                        RetryDecision::Retry => self.inner.counters.record_retry(),
                        RetryDecision::GiveUp(err) => {
                            return Err(err.with_request(request.method(), request.url()))
                        }
                    }
                }
            }
        }
    }
}

fn release(connection: Option<PooledConnection>) {
    if let Some(connection) = connection {
        connection.release();
    }
}
