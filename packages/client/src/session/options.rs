use std::time::Duration;

use serde_json::{Map, Value};

use super::Session;
use crate::auth::Auth;
use crate::http::{ClientCert, Data, FilePart, Method};

/// Per-call options of [`Session::request`].
///
/// Every field is optional; unset fields fall back to the session and then to
/// the configuration defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) params: Vec<(String, String)>,
    pub(crate) data: Option<Data>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) cookies: Vec<(String, String)>,
    pub(crate) files: Vec<FilePart>,
    pub(crate) auth: Option<Auth>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) allow_redirects: Option<bool>,
    pub(crate) proxies: Vec<(String, String)>,
    pub(crate) verify: Option<bool>,
    pub(crate) cert: Option<ClientCert>,
    pub(crate) session: Option<Session>,
    pub(crate) config: Map<String, Value>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(pairs.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Request body. Form data is url-encoded, or sent as multipart fields
    /// when files are attached.
    #[must_use]
    pub fn data(mut self, data: impl Into<Data>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set a header, replacing session and default headers of the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send a cookie with this request, on top of those in the session jar.
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Attach a file; the body becomes `multipart/form-data`.
    #[must_use]
    pub fn file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    #[must_use]
    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(Auth::basic(username, password))
    }

    /// Total time budget, redirects and retries included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }

    /// Proxy for a URL scheme (`"http"`, `"https"`) or `"all"`.
    #[must_use]
    pub fn proxy(mut self, scheme: impl Into<String>, proxy: impl Into<String>) -> Self {
        self.proxies.push((scheme.into(), proxy.into()));
        self
    }

    /// Verify server certificates (the default) or accept any.
    #[must_use]
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }

    #[must_use]
    pub fn cert(mut self, cert: ClientCert) -> Self {
        self.cert = Some(cert);
        self
    }

    /// Run the call on an existing session instead of an ad-hoc one.
    ///
    /// Only the module-level functions of the `courier` crate honor this;
    /// [`Session::request`] always uses the session it is called on.
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Override one configuration key for this call (see [`crate::Config::resolve`]).
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn config_map(mut self, overrides: Map<String, Value>) -> Self {
        self.config.extend(overrides);
        self
    }

    /// Whether redirects are followed for `method`: as set, otherwise
    /// everything but `HEAD`.
    #[must_use]
    pub fn allow_redirects_for(&self, method: Method) -> bool {
        self.allow_redirects.unwrap_or(method != Method::Head)
    }

    #[must_use]
    pub fn config_overrides(&self) -> &Map<String, Value> {
        &self.config
    }

    /// Detach the session set with [`RequestOptions::session`].
    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }
}
