use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HOST, PROXY_AUTHORIZATION};
use http::HeaderValue;
use url::Url;

use super::headers::HeaderList;
use super::method::Method;
use super::target;
use crate::auth::Auth;
use crate::error::{self, Result};
use crate::proxy;
use crate::transport::tls::{ClientCert, TlsOptions};

/// One fully built, not yet sent request.
///
/// Produced by [`crate::Session::prepare`] and never mutated afterwards: a
/// redirect hop derives a new `Request` from the previous one.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderList,
    pub(crate) body: Option<Bytes>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) auth: Option<Auth>,
    pub(crate) proxy: Option<Url>,
    pub(crate) tls: TlsOptions,
}

impl Request {
    pub(crate) fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderList::new(),
            body: None,
            timeout: None,
            auth: None,
            proxy: None,
            tls: TlsOptions::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers in the order they are written, before `Host` and `Content-Length` are added.
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Total time budget for the request, redirects and retries included.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[inline]
    #[must_use]
    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    /// Proxy this request goes through, if any.
    #[inline]
    #[must_use]
    pub fn proxy(&self) -> Option<&Url> {
        self.proxy.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn verify(&self) -> bool {
        self.tls.verify
    }

    #[inline]
    #[must_use]
    pub fn cert(&self) -> Option<&ClientCert> {
        self.tls.cert.as_ref()
    }

    /// Whether the request is sent in absolute form to a forwarding proxy
    /// rather than through a `CONNECT` tunnel or directly.
    pub(crate) fn forwards_through_proxy(&self) -> bool {
        self.proxy.is_some() && self.url.scheme() == "http"
    }

    /// Derive the next hop of a redirect chain.
    pub(crate) fn redirected(
        &self,
        method: Method,
        url: Url,
        headers: HeaderList,
        body: Option<Bytes>,
        keep_auth: bool,
    ) -> Request {
        Request {
            method,
            url,
            headers,
            body,
            timeout: self.timeout,
            auth: if keep_auth { self.auth.clone() } else { None },
            proxy: self.proxy.clone(),
            tls: self.tls.clone(),
        }
    }

    pub(crate) fn with_proxy(self, proxy: Option<Url>) -> Request {
        Request { proxy, ..self }
    }

    pub(crate) fn with_headers(self, headers: HeaderList) -> Request {
        Request { headers, ..self }
    }

    /// Convert to what a transport connection sends.
    ///
    /// Adds `Host` (with the port when it is not the scheme default),
    /// `Content-Length` for bodies and for body-carrying methods, and the
    /// proxy's `Proxy-Authorization` when forwarding.
    pub(crate) fn to_wire(&self) -> Result<http::Request<Bytes>> {
        let forward = self.forwards_through_proxy();
        let target = if forward {
            target::absolute_form(&self.url)
        } else {
            target::origin_form(&self.url)
        };
        let uri: http::Uri = target.parse().map_err(error::invalid_url)?;
        let body = self.body.clone().unwrap_or_default();
        let content_length = body.len();

        let mut wire = http::Request::new(body);
        *wire.method_mut() = self.method.to_http();
        *wire.uri_mut() = uri;

        let headers = wire.headers_mut();
        if !self.headers.contains(HOST) {
            if let Some(host) = target::host_header(&self.url) {
                headers.insert(HOST, HeaderValue::from_str(&host).map_err(error::invalid_header)?);
            }
        }
        for (name, value) in &self.headers {
            headers.append(name.clone(), value.clone());
        }
        if !self.headers.contains(CONTENT_LENGTH)
            && (self.body.is_some() || self.method.expects_body())
        {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(content_length));
        }
        if forward && !self.headers.contains(PROXY_AUTHORIZATION) {
            if let Some(credentials) = self.proxy.as_ref().and_then(proxy::basic_credentials) {
                let mut value = HeaderValue::from_str(&credentials).map_err(error::invalid_header)?;
                value.set_sensitive(true);
                headers.insert(PROXY_AUTHORIZATION, value);
            }
        }

        Ok(wire)
    }
}
