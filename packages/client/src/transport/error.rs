use std::fmt::Display;

use crate::error::{self, Error};

/// Failures reported by a [`super::Transport`] or [`super::Connection`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// DNS, TCP or proxy tunnel setup failed.
    #[error("connecting to {target} failed: {reason}")]
    Connect { target: String, reason: String },

    /// The connection dropped. `response_started` is set once response
    /// bytes were received, after which a retry could double-submit.
    #[error("connection reset: {reason}")]
    Reset { reason: String, response_started: bool },

    #[error("transport timed out: {reason}")]
    Timeout { reason: String },

    #[error("malformed response: {reason}")]
    Protocol { reason: String },

    #[error("TLS setup with {target} failed: {reason}")]
    Tls { target: String, reason: String },
}

impl TransportError {
    pub fn connect(target: impl Into<String>, reason: impl Display) -> Self {
        Self::Connect {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn reset(reason: impl Display) -> Self {
        Self::Reset {
            reason: reason.to_string(),
            response_started: false,
        }
    }

    pub fn reset_after_response(reason: impl Display) -> Self {
        Self::Reset {
            reason: reason.to_string(),
            response_started: true,
        }
    }

    pub fn timeout(reason: impl Display) -> Self {
        Self::Timeout {
            reason: reason.to_string(),
        }
    }

    pub fn protocol(reason: impl Display) -> Self {
        Self::Protocol {
            reason: reason.to_string(),
        }
    }

    pub fn tls(target: impl Into<String>, reason: impl Display) -> Self {
        Self::Tls {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether re-sending on a fresh connection cannot submit the request twice.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::Reset {
                    response_started: false,
                    ..
                }
        )
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect { .. } | TransportError::Tls { .. } => error::connect(err),
            TransportError::Reset { .. } => error::transport_reset(err),
            TransportError::Timeout { .. } => error::timeout(err),
            TransportError::Protocol { .. } => error::protocol(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_failures() {
        assert!(TransportError::connect("example.com:80", "refused").is_retryable());
        assert!(TransportError::reset("broken pipe").is_retryable());
        assert!(!TransportError::reset_after_response("eof in body").is_retryable());
        assert!(!TransportError::timeout("idle").is_retryable());
        assert!(!TransportError::protocol("bad status line").is_retryable());
        assert!(!TransportError::tls("example.com:443", "bad certificate").is_retryable());
    }

    #[test]
    fn error_kinds() {
        let err: Error = TransportError::connect("example.com:80", "refused").into();
        assert!(err.is_connect());
        assert_eq!(
            err.to_string(),
            "error connecting to host: connecting to example.com:80 failed: refused"
        );
        let err: Error = TransportError::reset_after_response("eof").into();
        assert!(err.is_transport_reset());
        let err: Error = TransportError::protocol("garbage").into();
        assert!(err.is_protocol());
    }
}
