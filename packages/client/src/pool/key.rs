use std::fmt;

use crate::error::{self, Result};
use crate::http::{target, Request};
use crate::proxy;
use crate::transport::{authority, TlsOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub(crate) fn parse(scheme: &str) -> Result<Self> {
        match scheme {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(error::invalid_url(format!("unsupported URL scheme `{other}`"))),
        }
    }
}

/// A proxy that `https` connections are tunnelled through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    /// Value of the `Proxy-Authorization` header sent with `CONNECT`.
    pub authorization: Option<String>,
}

/// Identity of a pooled connection.
///
/// Scheme, host and port of the peer the connection talks HTTP to, plus the
/// tunnelling proxy and the TLS parameters for `https`: two requests may
/// share a connection only if all of them match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub proxy: Option<ProxyEndpoint>,
    pub tls: Option<TlsOptions>,
}

impl PoolKey {
    /// Key for a direct connection with default TLS options.
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
            proxy: None,
            tls: match scheme {
                Scheme::Http => None,
                Scheme::Https => Some(TlsOptions::default()),
            },
        }
    }

    /// The connection `request` must be sent over.
    ///
    /// Plain `http` through a proxy is keyed by the proxy itself (requests
    /// are forwarded in absolute form); `https` through a proxy is keyed by
    /// the origin plus the tunnel.
    pub(crate) fn for_request(request: &Request) -> Result<Self> {
        let url = request.url();
        let scheme = Scheme::parse(url.scheme())?;

        match (request.proxy(), scheme) {
            (Some(proxy), Scheme::Http) => Ok(Self::new(
                Scheme::Http,
                target::dial_host(proxy)?,
                target::dial_port(proxy)?,
            )),
            (Some(proxy), Scheme::Https) => Ok(Self {
                scheme,
                host: target::dial_host(url)?,
                port: target::dial_port(url)?,
                proxy: Some(ProxyEndpoint {
                    host: target::dial_host(proxy)?,
                    port: target::dial_port(proxy)?,
                    authorization: proxy::basic_credentials(proxy),
                }),
                tls: Some(request.tls.clone()),
            }),
            (None, Scheme::Http) => Ok(Self::new(
                scheme,
                target::dial_host(url)?,
                target::dial_port(url)?,
            )),
            (None, Scheme::Https) => Ok(Self {
                tls: Some(request.tls.clone()),
                ..Self::new(scheme, target::dial_host(url)?, target::dial_port(url)?)
            }),
        }
    }

    /// `host:port` of the origin, IPv6 literals bracketed.
    #[must_use]
    pub fn authority(&self) -> String {
        authority(&self.host, self.port)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        write!(f, "{scheme}://{}", self.authority())?;
        if let Some(proxy) = &self.proxy {
            write!(f, " via {}", authority(&proxy.host, proxy.port))?;
        }
        Ok(())
    }
}
