use http::StatusCode;
use url::Url;

use super::headers::{is_cross_host, remove_body_headers, remove_sensitive_headers};
use crate::config::Config;
use crate::error::{self, Result};
use crate::http::{target, Method, Request, Response};

/// What to do after a response arrived.
#[derive(Debug, Clone)]
pub enum RedirectAction {
    /// Send `next`; `remaining` redirects are left after it.
    Continue { next: Request, remaining: usize },
    /// Hand the response to the caller as it is.
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Not a status redirects are followed for (this includes 300, 304, 305 and 306).
    NotRedirect,
    MissingLocation,
    /// `Location` could not be resolved against the previous URL.
    InvalidLocation,
    /// `Location` points at a scheme other than `http` or `https`.
    UnsupportedScheme,
}

/// Computes the next request of a redirect chain.
///
/// - 301, 302 and 303 downgrade to `GET` without a body unless `strict_mode`
///   is set; `HEAD` stays `HEAD`.
/// - 307 and 308 always keep method and body.
/// - `Location` is resolved against the previous URL and inherits its
///   fragment when it has none.
/// - Leaving the host drops `Host`, `Authorization`, `Cookie` and
///   `Proxy-Authorization`, and with them the request's auth.
#[derive(Debug, Clone, Copy)]
pub struct RedirectResolver {
    strict_mode: bool,
    max_redirects: usize,
}

impl RedirectResolver {
    #[must_use]
    pub fn new(strict_mode: bool, max_redirects: usize) -> Self {
        Self {
            strict_mode,
            max_redirects,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.strict_mode(), config.max_redirects())
    }

    /// Budget a fresh chain starts with.
    #[must_use]
    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Decide how to follow `response`, the answer to `previous`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Kind::TooManyRedirects`] when the response must be
    /// followed and `remaining` is 0.
    pub fn resolve(
        &self,
        previous: &Request,
        response: &Response,
        remaining: usize,
    ) -> Result<RedirectAction> {
        let Some(status) = response.status().filter(|_| response.is_redirect()) else {
            return Ok(RedirectAction::Stop(StopReason::NotRedirect));
        };
        let Some(location) = response.location() else {
            return Ok(RedirectAction::Stop(StopReason::MissingLocation));
        };
        if remaining == 0 {
            return Err(error::too_many_redirects(self.max_redirects)
                .with_request(previous.method(), previous.url()));
        }

        let Ok(mut next_url) = previous.url().join(location) else {
            tracing::debug!(location, "redirect location does not resolve");
            return Ok(RedirectAction::Stop(StopReason::InvalidLocation));
        };
        if target::check(&next_url).is_err() {
            tracing::debug!(%next_url, "redirect to unsupported target");
            return Ok(RedirectAction::Stop(StopReason::UnsupportedScheme));
        }
        if next_url.fragment().is_none() {
            next_url.set_fragment(previous.url().fragment());
        }

        let next = self.next_request(previous, status, next_url);
        tracing::debug!(
            status = status.as_u16(),
            from = %previous.url(),
            to = %next.url(),
            method = %next.method(),
            "following redirect"
        );
        Ok(RedirectAction::Continue {
            next,
            remaining: remaining - 1,
        })
    }

    fn next_request(&self, previous: &Request, status: StatusCode, url: Url) -> Request {
        let downgrade = !self.strict_mode
            && previous.method() != Method::Head
            && matches!(
                status,
                StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
            );

        let mut headers = previous.headers().clone();
        remove_sensitive_headers(&mut headers, previous.url(), &url);
        let keep_auth = !is_cross_host(previous.url(), &url);

        let (method, body) = if downgrade {
            remove_body_headers(&mut headers);
            (Method::Get, None)
        } else {
            (previous.method(), previous.body().cloned())
        };

        previous.redirected(method, url, headers, body, keep_auth)
    }
}
