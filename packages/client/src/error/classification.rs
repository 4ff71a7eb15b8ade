use http::StatusCode;

use super::types::{Error, Kind};

impl Error {
    /// Returns true if the error comes from configuration resolution.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self.inner.kind, Kind::Config)
    }

    /// Returns true if the request could not be built.
    #[must_use]
    pub fn is_invalid_request(&self) -> bool {
        matches!(self.inner.kind, Kind::InvalidRequest)
    }

    #[must_use]
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self.inner.kind, Kind::PoolExhausted)
    }

    /// Returns true if the error is related to connect
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    /// Returns true if the error is related to a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::Timeout)
    }

    #[must_use]
    pub fn is_transport_reset(&self) -> bool {
        matches!(self.inner.kind, Kind::TransportReset)
    }

    /// Returns true if the redirect chain was too long.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self.inner.kind, Kind::TooManyRedirects)
    }

    #[must_use]
    pub fn is_session_closed(&self) -> bool {
        matches!(self.inner.kind, Kind::SessionClosed)
    }

    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(self.inner.kind, Kind::Protocol)
    }

    /// Returns true if the error is from `Response::error_for_status`.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.inner.kind, Kind::Status(_))
    }

    /// Transport-layer failures, the only kind a retry policy may re-attempt.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self.inner.kind,
            Kind::Connect | Kind::Timeout | Kind::TransportReset
        )
    }

    /// Connect and reset failures, the kinds a retry policy re-attempts.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect | Kind::TransportReset)
    }

    /// Returns the status code, if the error was generated from a response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self.inner.kind {
            Kind::Status(code) => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error;

    #[test]
    fn only_connect_and_reset_are_retryable() {
        assert!(error::connect("refused").is_retryable());
        assert!(error::transport_reset("reset by peer").is_retryable());
        assert!(!error::timeout("deadline").is_retryable());
        assert!(!error::protocol("bad status line").is_retryable());
        assert!(error::timeout("deadline").is_transport());
    }
}
