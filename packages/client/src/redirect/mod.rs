//! Redirect handling
//!
//! A [`RedirectResolver`] turns a 3xx response into the next [`crate::Request`]
//! of the chain, or tells the session to stop. The session owns the loop and
//! the redirect budget (`max_redirects`, 30 by default).

mod headers;
mod resolver;

pub use resolver::{RedirectAction, RedirectResolver, StopReason};
