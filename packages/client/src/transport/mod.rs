//! Transport collaborator
//!
//! The pool never touches sockets itself: it asks a [`Transport`] for new
//! [`Connection`]s keyed by [`PoolKey`] and hands them out one request at a
//! time. [`HttpTransport`] is the production implementation (tokio TCP,
//! optional proxy `CONNECT` tunnel, rustls, hyper HTTP/1.1 framing); tests
//! substitute scripted transports.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

pub mod error;
pub mod http1;
pub mod tls;
pub(crate) mod tunnel;

pub use error::TransportError;
pub use http1::Http1Connection;
pub use tls::{ClientCert, TlsOptions};

use crate::pool::{PoolKey, Scheme};

/// Opens connections for the pool.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Establish a new connection for `key`, tunnelling and TLS included.
    async fn connect(&self, key: &PoolKey) -> Result<Box<dyn Connection>, TransportError>;
}

/// One established connection, carrying one request at a time.
#[async_trait]
pub trait Connection: Send + fmt::Debug {
    /// Write a request. Its response is read with [`Connection::recv`].
    async fn send(&mut self, request: http::Request<Bytes>) -> Result<(), TransportError>;

    /// Read the response to the last request, body included.
    async fn recv(&mut self) -> Result<http::Response<Bytes>, TransportError>;

    fn close(&mut self);

    /// Whether the connection can carry another request.
    fn is_healthy(&self) -> bool;
}

/// Production transport: TCP, optional `CONNECT` tunnel, rustls and HTTP/1.1.
///
/// Holds no connections, only a cache of TLS client configurations keyed by
/// the TLS options they were built for.
pub struct HttpTransport {
    connect_timeout: Option<Duration>,
    tls_configs: Mutex<HashMap<TlsOptions, Arc<rustls::ClientConfig>>>,
}

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout: None,
            tls_configs: Mutex::new(HashMap::new()),
        }
    }

    /// Bound TCP connection establishment, proxy tunnel included.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    async fn dial(&self, host: &str, port: u16) -> Result<TcpStream, TransportError> {
        let target = authority(host, port);
        let connecting = TcpStream::connect((host, port));
        let stream = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connecting)
                .await
                .map_err(|_| TransportError::connect(&target, format!("timed out after {limit:?}")))?,
            None => connecting.await,
        }
        .map_err(|e| TransportError::connect(&target, e))?;

        if let Err(err) = stream.set_nodelay(true) {
            tracing::trace!(%target, error = %err, "could not set TCP_NODELAY");
        }
        Ok(stream)
    }

    fn tls_connector(&self, options: &TlsOptions, target: &str) -> Result<TlsConnector, TransportError> {
        let mut configs = self
            .tls_configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let config = match configs.get(options) {
            Some(config) => config.clone(),
            None => {
                let config = Arc::new(tls::client_config(options, target)?);
                configs.insert(options.clone(), config.clone());
                config
            }
        };
        Ok(TlsConnector::from(config))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn connect(&self, key: &PoolKey) -> Result<Box<dyn Connection>, TransportError> {
        let target = key.authority();
        let stream = match &key.proxy {
            Some(proxy) => {
                let stream = self.dial(&proxy.host, proxy.port).await?;
                let tunnel = tunnel::establish(stream, &target, proxy.authorization.as_deref());
                match self.connect_timeout {
                    Some(limit) => tokio::time::timeout(limit, tunnel).await.map_err(|_| {
                        TransportError::connect(&target, format!("proxy tunnel timed out after {limit:?}"))
                    })??,
                    None => tunnel.await?,
                }
            }
            None => self.dial(&key.host, key.port).await?,
        };

        match key.scheme {
            Scheme::Http => {
                tracing::trace!(%target, "plain connection established");
                Ok(Box::new(Http1Connection::handshake(stream, &target).await?))
            }
            Scheme::Https => {
                let options = key.tls.clone().unwrap_or_default();
                let connector = self.tls_connector(&options, &target)?;
                let server_name = ServerName::try_from(key.host.clone())
                    .map_err(|e| TransportError::tls(&target, e))?;
                let stream = connector
                    .connect(server_name, stream)
                    .await
                    .map_err(|e| TransportError::tls(&target, e))?;
                tracing::trace!(%target, "TLS connection established");
                Ok(Box::new(Http1Connection::handshake(stream, &target).await?))
            }
        }
    }
}

/// `host:port`, bracketing IPv6 literals.
pub(crate) fn authority(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
