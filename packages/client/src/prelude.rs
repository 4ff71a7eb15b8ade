//! Courier prelude
//!
//! The types end users touch when issuing requests. Lower-level pieces
//! (pool, transport, redirect resolver) stay under their own modules.

pub use crate::auth::{Auth, AuthProvider, BasicAuth};
pub use crate::config::Config;
pub use crate::cookie::Jar;
pub use crate::error::{Error, Kind, RequestContext, Result};
pub use crate::http::{ClientCert, Data, FilePart, HeaderList, Method, Request, Response};
pub use crate::pool::PoolStats;
pub use crate::session::{RequestOptions, Session, SessionBuilder, SessionStats};

// HTTP standard types from http crate
pub use ::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

// URL handling
pub use url::Url;
