//! # Courier
//!
//! Verb-named HTTP functions over pooled, redirect-aware sessions.
//!
//! Every function forwards to [`request`], which runs the call on the
//! session given in [`RequestOptions::session`] or on an ad-hoc session
//! that lives exactly as long as the call. Configuration comes from the
//! process defaults ([`defaults`]), the session and the per-call
//! `config` overrides, in increasing precedence.
//!
//! ```no_run
//! use courier::{Data, RequestOptions};
//!
//! # async fn run() -> courier::Result<()> {
//! let response = courier::get("http://example.com/", RequestOptions::new()).await?;
//! println!("{:?}", response.status());
//!
//! let session = courier::session();
//! let form = Data::form([("name", "courier")]);
//! courier::post(
//!     "http://example.com/submit",
//!     Some(form),
//!     RequestOptions::new().session(session.clone()),
//! )
//! .await?;
//! session.close();
//! # Ok(())
//! # }
//! ```
//!
//! With `safe_mode` set (and `danger_mode` not), failures come back as a
//! [`Response`] without a status whose [`Response::error`] holds the error.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

mod adhoc;
mod methods;
mod safe_mode;

pub use methods::{delete, get, head, options, patch, post, put, request};

// Re-export the client surface so callers need a single dependency.
pub use courier_client::prelude::*;
pub use courier_client::{auth, cookie, error, pool, proxy, redirect, retry, transport};

/// A new session with the process defaults.
///
/// Sessions keep connections and cookies between calls; pass one with
/// [`RequestOptions::session`] and close it when done.
#[must_use]
pub fn session() -> Session {
    Session::new()
}

/// The process-wide configuration defaults.
#[must_use]
pub fn defaults() -> &'static Config {
    Config::defaults()
}
