use std::time::Duration;

use bytes::Bytes;
use http::header::{CONNECTION, LOCATION};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::request::Request;
use crate::error::{self, Error, Result};

/// Status codes a redirect may be followed for.
const FOLLOWED_REDIRECTS: [StatusCode; 5] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

/// A response with its body read in full.
///
/// In safe mode a failed request is still returned as a `Response`: it has
/// no status and [`Response::error`] holds the failure.
#[derive(Debug, Clone)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Bytes,
    url: Option<Url>,
    request: Option<Request>,
    history: Vec<Response>,
    elapsed: Duration,
    error: Option<Error>,
}

impl Response {
    pub(crate) fn from_wire(wire: http::Response<Bytes>, request: Request, elapsed: Duration) -> Self {
        let (parts, body) = wire.into_parts();
        Self {
            status: Some(parts.status),
            headers: parts.headers,
            body,
            url: Some(request.url.clone()),
            request: Some(request),
            history: Vec::new(),
            elapsed,
            error: None,
        }
    }

    /// A response standing in for a failed request.
    #[must_use]
    pub fn from_error(error: Error) -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            url: error.url().cloned(),
            request: None,
            history: Vec::new(),
            elapsed: Duration::ZERO,
            error: Some(error),
        }
    }

    pub(crate) fn with_history(mut self, history: Vec<Response>) -> Self {
        self.history = history;
        self
    }

    /// `None` when the request failed before a response arrived.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The URL this response was fetched from, after redirects.
    #[inline]
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// The request that produced this response.
    #[inline]
    #[must_use]
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// Redirect responses that led here, oldest first.
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[Response] {
        &self.history
    }

    /// Time from sending the request to reading the whole body.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// True for a received response with a status below 400.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.error.is_none()
            && self
                .status
                .is_some_and(|status| !status.is_client_error() && !status.is_server_error())
    }

    /// Whether the status is one a redirect can be followed for.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.status
            .is_some_and(|status| FOLLOWED_REDIRECTS.contains(&status))
    }

    /// The raw `Location` header, if present.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// Whether the server asked for the connection to be closed.
    pub(crate) fn closes_connection(&self) -> bool {
        self.headers.get_all(CONNECTION).iter().any(|value| {
            value
                .to_str()
                .map(|tokens| {
                    tokens
                        .split(',')
                        .any(|token| token.trim().eq_ignore_ascii_case("close"))
                })
                .unwrap_or(false)
        })
    }

    /// The body decoded as UTF-8, invalid sequences replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Fails with a protocol error when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(error::protocol)
    }

    /// Turn a 4xx or 5xx response into an error.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::Kind::Status`] error carrying the request context.
    pub fn error_for_status(self) -> Result<Self> {
        match self.error_for_status_ref() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    fn error_for_status_ref(&self) -> Option<Error> {
        let status = self.status?;
        if !status.is_client_error() && !status.is_server_error() {
            return None;
        }
        let err = error::status_code(status);
        Some(match &self.request {
            Some(request) => err.with_request(request.method, &request.url),
            None => err,
        })
    }
}
