use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use http::header::SET_COOKIE;
use http::HeaderMap;
use url::Url;

/// In-memory cookie store scoped by domain and path.
#[derive(Default)]
pub struct Jar(RwLock<cookie_store::CookieStore>);

impl Jar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie as if `url` had sent it in a `Set-Cookie` header.
    ///
    /// Unparsable cookies are ignored.
    pub fn add_cookie_str(&self, cookie: &str, url: &Url) {
        let parsed = cookie::Cookie::parse(cookie)
            .map(cookie::Cookie::into_owned)
            .ok();
        self.write().store_response_cookies(parsed.into_iter(), url);
    }

    /// Store every `Set-Cookie` header of a response fetched from `url`.
    pub(crate) fn store_response(&self, headers: &HeaderMap, url: &Url) {
        let cookies: Vec<_> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| match cookie::Cookie::parse(value) {
                Ok(cookie) => Some(cookie.into_owned()),
                Err(err) => {
                    tracing::debug!(error = %err, "ignoring malformed Set-Cookie header");
                    None
                }
            })
            .collect();
        if cookies.is_empty() {
            return;
        }
        tracing::trace!(count = cookies.len(), %url, "storing response cookies");
        self.write().store_response_cookies(cookies.into_iter(), url);
    }

    /// `name=value` pairs to send to `url`.
    #[must_use]
    pub fn request_values(&self, url: &Url) -> Vec<(String, String)> {
        self.read()
            .get_request_values(url)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// Value of the unexpired cookie `name` stored for exactly `domain` and `path`.
    #[must_use]
    pub fn get(&self, domain: &str, path: &str, name: &str) -> Option<String> {
        self.read()
            .get(domain, path, name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Number of cookies held, expired ones included until they are evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().iter_any().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, cookie_store::CookieStore> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, cookie_store::CookieStore> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Jar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jar").field("cookies", &self.len()).finish()
    }
}

/// Render `name=value` pairs as a `Cookie` header value.
pub(crate) fn header_value<'a, I>(pairs: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let rendered = pairs
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    (!rendered.is_empty()).then_some(rendered)
}
