use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use url::Url;

use crate::http::Method;

/// A Result alias where the Err case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur while building, sending or following a request.
#[derive(Clone)]
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

#[derive(Clone)]
pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) source: Option<Arc<dyn StdError + Send + Sync>>,
    pub(crate) context: Option<RequestContext>,
    pub(crate) attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Unknown configuration key or a value of the wrong type.
    Config,
    /// The request could not be built: bad URL, unsupported scheme, invalid header.
    InvalidRequest,
    /// No connection available under the pool's capacity policy.
    PoolExhausted,
    /// Connection establishment failed (DNS, TCP, TLS, proxy tunnel).
    Connect,
    /// The request exceeded its total time budget.
    Timeout,
    /// The connection dropped before a response was received.
    TransportReset,
    /// The redirect chain exceeded `max_redirects`.
    TooManyRedirects,
    /// The session was closed before or during the request.
    SessionClosed,
    /// The peer sent something that is not a valid HTTP response.
    Protocol,
    /// A 4xx or 5xx status surfaced as an error.
    Status(StatusCode),
}

/// The request a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Method,
    pub url: Url,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                context: None,
                attempts: 0,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(Arc::from(source.into()));
        self
    }

    /// Attach the request this error belongs to. An existing context is kept.
    #[must_use]
    pub fn with_request(mut self, method: Method, url: &Url) -> Self {
        if self.inner.context.is_none() {
            self.inner.context = Some(RequestContext {
                method,
                url: url.clone(),
            });
        }
        self
    }

    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.inner.attempts = attempts;
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// The request that failed, when the failure happened after the URL was parsed.
    #[must_use]
    pub fn context(&self) -> Option<&RequestContext> {
        self.inner.context.as_ref()
    }

    /// Get the URL associated with this error, if any
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.inner.context.as_ref().map(|context| &context.url)
    }

    /// Number of send attempts made before the failure surfaced (0 when none was made).
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.inner.attempts
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("courier::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref context) = self.inner.context {
            f.field("method", &context.method);
            f.field("url", &context.url.as_str());
        }

        if self.inner.attempts > 0 {
            f.field("attempts", &self.inner.attempts);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::Config => f.write_str("configuration error")?,
            Kind::InvalidRequest => f.write_str("invalid request")?,
            Kind::PoolExhausted => f.write_str("connection pool exhausted")?,
            Kind::Connect => f.write_str("error connecting to host")?,
            Kind::Timeout => f.write_str("request timeout")?,
            Kind::TransportReset => f.write_str("connection reset by peer")?,
            Kind::TooManyRedirects => f.write_str("too many redirects")?,
            Kind::SessionClosed => f.write_str("session is closed")?,
            Kind::Protocol => f.write_str("malformed response")?,
            Kind::Status(code) => {
                let prefix = if code.is_client_error() {
                    "HTTP status client error"
                } else {
                    "HTTP status server error"
                };
                write!(f, "{prefix} ({code})")?;
            }
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        if let Some(ref context) = self.inner.context {
            write!(f, " [{} {}", context.method, context.url)?;
            if self.inner.attempts > 0 {
                write!(f, ", attempt {}", self.inner.attempts)?;
            }
            f.write_str("]")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
