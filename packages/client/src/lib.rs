//! # Courier session core
//!
//! HTTP/1.1 client core that the verb-named functions of the `courier` crate
//! forward to. A [`Session`] owns a keyed connection pool, a cookie jar and an
//! immutable [`Config`], and drives each logical request through connection
//! acquisition, redirect resolution and transport-failure retries.
//!
//! ## Features
//!
//! - **Connection pooling** keyed by scheme, host and port, bounded per key and in total
//! - **Redirect resolution** with RFC-faithful method handling behind `strict_mode`
//! - **Retry policy** for connection-establishment and transport-reset failures
//! - **Cookie persistence** per session, scoped by domain and path
//! - **Rustls TLS** with webpki roots, optional verification bypass and client certificates
//! - **Proxy support** for plain forwarding and `CONNECT` tunnels, including environment proxies
//!
//! ## Usage
//!
//! ```no_run
//! use courier_client::{RequestOptions, Session};
//!
//! # async fn run() -> courier_client::Result<()> {
//! let session = Session::new();
//! let response = session
//!     .get("http://example.com/", RequestOptions::new().param("q", "rust"))
//!     .await?;
//! println!("{:?} after {} redirects", response.status(), response.history().len());
//! session.close();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

use std::sync::Arc;
use std::sync::OnceLock;

pub mod auth;
pub mod config;
pub mod cookie;
pub mod error;
pub mod http;
pub mod pool;
pub mod proxy;
pub mod redirect;
pub mod retry;
pub mod session;
pub mod transport;

pub mod prelude;

pub use crate::prelude::*;

/// Process-wide transport shared by sessions built without an explicit one.
static GLOBAL_TRANSPORT: OnceLock<Arc<transport::HttpTransport>> = OnceLock::new();

/// Get the shared [`transport::HttpTransport`].
///
/// The transport only caches TLS client configurations, so sharing it across
/// sessions never shares connections: every session still owns its own pool.
pub fn global_transport() -> Arc<transport::HttpTransport> {
    GLOBAL_TRANSPORT
        .get_or_init(|| Arc::new(transport::HttpTransport::new()))
        .clone()
}
