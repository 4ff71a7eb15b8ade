//! Error taxonomy for sessions, pools, redirects and transports.

pub mod classification;
pub mod constructors;
pub mod types;

pub use constructors::*;
pub use types::{Error, Kind, RequestContext, Result};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
