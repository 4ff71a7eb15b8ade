//! Sessions
//!
//! A [`Session`] carries everything that outlives a single request: the
//! resolved [`crate::Config`], a connection pool, a cookie jar, default
//! headers, auth and proxies. Each call to [`Session::request`] runs the
//! same sequence:
//!
//! 1. **Build**: resolve per-call config overrides and options into a
//!    [`crate::Request`] ([`Session::prepare`] stops here).
//! 2. **Dispatch**: acquire a pooled connection for the request's key and
//!    exchange request and response.
//! 3. **Outcome**: retry transport failures the retry policy allows; follow
//!    redirects the resolver allows, storing cookies from every hop.
//! 4. **Terminal**: return the final response with its history, or the error.
//!
//! A total timeout bounds steps 2 and 3 together. Sessions are cheap to clone
//! and safe to use from many tasks at once.

mod builder;
mod core;
mod dispatch;
mod options;
mod prepare;
mod stats;

pub use self::builder::SessionBuilder;
pub use self::core::Session;
pub use self::options::RequestOptions;
pub use self::stats::SessionStats;
