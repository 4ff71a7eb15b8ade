//! HTTP CONNECT tunnel establishment
//!
//! `https` requests through a proxy ask it to open a raw TCP tunnel to the
//! origin; TLS then runs end to end inside that tunnel.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::TransportError;

/// Upper bound on the proxy's reply head.
const MAX_REPLY_HEAD: usize = 8 * 1024;

/// Send `CONNECT host:port` over `stream` and wait for a 2xx reply.
///
/// The reply is read byte by byte so nothing past its blank line is consumed.
pub(crate) async fn establish<S>(
    mut stream: S,
    authority: &str,
    proxy_authorization: Option<&str>,
) -> Result<S, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
    if let Some(credentials) = proxy_authorization {
        request.push_str(&format!("Proxy-Authorization: {credentials}\r\n"));
    }
    request.push_str("\r\n");

    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| TransportError::connect(authority, format!("sending CONNECT: {e}")))?;
    stream
        .flush()
        .await
        .map_err(|e| TransportError::connect(authority, format!("sending CONNECT: {e}")))?;

    let head = read_head(&mut stream, authority).await?;
    let status_line = head.lines().next().unwrap_or_default();
    match parse_status(status_line) {
        Some(status) if (200..300).contains(&status) => {
            tracing::debug!(%authority, status, "proxy tunnel established");
            Ok(stream)
        }
        Some(status) => Err(TransportError::connect(
            authority,
            format!("proxy refused tunnel with status {status}"),
        )),
        None => Err(TransportError::protocol(format!(
            "invalid CONNECT reply: {status_line:?}"
        ))),
    }
}

async fn read_head<S>(stream: &mut S, authority: &str) -> Result<String, TransportError>
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(256);
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_REPLY_HEAD {
            return Err(TransportError::protocol("CONNECT reply head too large"));
        }
        let read = stream
            .read(&mut byte)
            .await
            .map_err(|e| TransportError::connect(authority, format!("reading CONNECT reply: {e}")))?;
        if read == 0 {
            return Err(TransportError::connect(
                authority,
                "proxy closed the connection during CONNECT",
            ));
        }
        head.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

fn parse_status(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/1.") {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tunnel_accepts_2xx() {
        let (client, mut proxy) = tokio::io::duplex(1024);
        let server = tokio::spawn(async move {
            let mut received = vec![0u8; 1024];
            let n = proxy.read(&mut received).await.expect("proxy read");
            proxy
                .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
                .await
                .expect("proxy write");
            String::from_utf8_lossy(&received[..n]).into_owned()
        });

        let result = establish(client, "example.com:443", Some("Basic dTpw")).await;
        assert!(result.is_ok());
        let request = server.await.expect("proxy task");
        assert_eq!(
            request,
            "CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\nProxy-Authorization: Basic dTpw\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn tunnel_refusal_is_a_connect_error() {
        let (client, mut proxy) = tokio::io::duplex(1024);
        tokio::spawn(async move {
            let mut received = vec![0u8; 1024];
            let _ = proxy.read(&mut received).await;
            let _ = proxy
                .write_all(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n")
                .await;
        });

        match establish(client, "example.com:443", None).await {
            Err(TransportError::Connect { reason, .. }) => assert!(reason.contains("407")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn tunnel_rejects_non_http_reply() {
        let proxy = tokio_test::io::Builder::new()
            .write(b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n")
            .read(b"SSH-2.0-OpenSSH\r\n\r\n")
            .build();

        match establish(proxy, "example.com:443", None).await {
            Err(TransportError::Protocol { .. }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn status_line_parsing() {
        assert_eq!(parse_status("HTTP/1.0 200 OK"), Some(200));
        assert_eq!(parse_status("SSH-2.0"), None);
    }
}
