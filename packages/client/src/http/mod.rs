//! Request and response types
//!
//! [`Request`] is the immutable description of one send, [`Response`] what
//! came back (plus the redirect history that led to it). Headers keep their
//! insertion order in a [`HeaderList`] so the bytes on the wire are
//! deterministic.

pub mod body;
pub mod compression;
pub mod headers;
pub mod method;
pub mod request;
pub mod response;
pub mod target;

pub use body::{Data, FilePart};
pub use headers::HeaderList;
pub use method::Method;
pub use request::Request;
pub use response::Response;

pub use crate::transport::tls::ClientCert;
