use super::BoxError;
use super::types::{Error, Kind};

/// Creates an `Error` for a bad configuration key or value.
pub fn config<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Config).with(e.into())
}

/// Creates an `Error` for a request that could not be built.
pub fn invalid_request<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::InvalidRequest).with(e.into())
}

/// Creates an `Error` for an invalid or unsupported URL.
pub fn invalid_url<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::InvalidRequest).with(e.into())
}

/// Creates an `Error` for a header name or value that cannot go on the wire.
pub fn invalid_header<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::InvalidRequest).with(e.into())
}

pub fn pool_exhausted<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::PoolExhausted).with(e.into())
}

pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect).with(e.into())
}

pub fn timeout<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Timeout).with(e.into())
}

pub fn transport_reset<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::TransportReset).with(e.into())
}

pub fn too_many_redirects(limit: usize) -> Error {
    Error::new(Kind::TooManyRedirects).with(format!("exceeded {limit} redirects"))
}

pub fn session_closed() -> Error {
    Error::new(Kind::SessionClosed)
}

pub fn protocol<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Protocol).with(e.into())
}

pub fn status_code(status: http::StatusCode) -> Error {
    Error::new(Kind::Status(status))
}
