//! Session cookie storage
//!
//! Every session owns a [`Jar`]: `Set-Cookie` headers from each response in
//! a chain go in, and the matching `Cookie` header is computed for each
//! request URL from domain, path, expiry and the `Secure` attribute.

pub mod core;

pub use self::core::Jar;
