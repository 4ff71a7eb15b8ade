//! HTTP/1.1 connections driven by hyper's client `conn` API.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;

use super::{Connection, TransportError};

type PendingResponse =
    Pin<Box<dyn Future<Output = Result<hyper::Response<Incoming>, hyper::Error>> + Send>>;

/// One HTTP/1.1 connection over any byte stream (plain TCP or TLS).
///
/// hyper owns the framing; the connection task runs on its own and is
/// aborted on [`Connection::close`] or drop.
pub struct Http1Connection {
    sender: http1::SendRequest<Full<Bytes>>,
    driver: JoinHandle<()>,
    pending: Option<PendingResponse>,
    closed: bool,
}

impl Http1Connection {
    pub(crate) async fn handshake<S>(stream: S, target: &str) -> Result<Self, TransportError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sender, connection) = http1::Builder::new()
            .title_case_headers(true)
            .handshake(TokioIo::new(stream))
            .await
            .map_err(|e| TransportError::connect(target, e))?;

        let target = target.to_string();
        let driver = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::debug!(%target, error = %err, "HTTP/1.1 connection ended with error");
            }
        });

        Ok(Self {
            sender,
            driver,
            pending: None,
            closed: false,
        })
    }
}

fn classify(err: hyper::Error) -> TransportError {
    if err.is_parse() || err.is_parse_status() {
        TransportError::protocol(err)
    } else if err.is_timeout() {
        TransportError::timeout(err)
    } else {
        TransportError::reset(err)
    }
}

#[async_trait]
impl Connection for Http1Connection {
    async fn send(&mut self, request: http::Request<Bytes>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::reset("connection was closed"));
        }
        if self.pending.is_some() {
            return Err(TransportError::protocol("previous response was not received"));
        }
        self.sender.ready().await.map_err(classify)?;
        let request = request.map(Full::new);
        self.pending = Some(Box::pin(self.sender.send_request(request)));
        Ok(())
    }

    async fn recv(&mut self) -> Result<http::Response<Bytes>, TransportError> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| TransportError::protocol("no request in flight"))?;
        let response = pending.await.map_err(classify)?;
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(TransportError::reset_after_response)?
            .to_bytes();
        Ok(http::Response::from_parts(parts, body))
    }

    fn close(&mut self) {
        self.closed = true;
        self.pending = None;
        self.driver.abort();
    }

    fn is_healthy(&self) -> bool {
        !self.closed
            && self.pending.is_none()
            && !self.sender.is_closed()
            && !self.driver.is_finished()
    }
}

impl Drop for Http1Connection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

impl fmt::Debug for Http1Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Http1Connection")
            .field("closed", &self.closed)
            .field("in_flight", &self.pending.is_some())
            .finish()
    }
}
