//! Rustls client configuration
//!
//! Certificates are checked against the webpki roots unless verification is
//! turned off per request, in which case any server certificate is accepted
//! (handshake signatures are still checked). A client certificate may be
//! presented, loaded from PEM files.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use super::TransportError;

/// TLS parameters of a request. Part of the pool key for `https`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TlsOptions {
    pub verify: bool,
    pub cert: Option<ClientCert>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verify: true,
            cert: None,
        }
    }
}

/// A client certificate: either one PEM file holding chain and key, or two files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientCert {
    cert: PathBuf,
    key: Option<PathBuf>,
}

impl ClientCert {
    /// Certificate chain and private key in the same PEM file.
    pub fn new(pem: impl Into<PathBuf>) -> Self {
        Self {
            cert: pem.into(),
            key: None,
        }
    }

    pub fn with_key(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            cert: cert.into(),
            key: Some(key.into()),
        }
    }

    fn load(
        &self,
        target: &str,
    ) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TransportError> {
        let chain = rustls_pemfile::certs(&mut open(&self.cert, target)?)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TransportError::tls(target, format!("reading {}: {e}", self.cert.display())))?;
        if chain.is_empty() {
            return Err(TransportError::tls(
                target,
                format!("no certificate in {}", self.cert.display()),
            ));
        }

        let key_path = self.key.as_deref().unwrap_or(&self.cert);
        let key = rustls_pemfile::private_key(&mut open(key_path, target)?)
            .map_err(|e| TransportError::tls(target, format!("reading {}: {e}", key_path.display())))?
            .ok_or_else(|| {
                TransportError::tls(target, format!("no private key in {}", key_path.display()))
            })?;

        Ok((chain, key))
    }
}

fn open(path: &Path, target: &str) -> Result<BufReader<File>, TransportError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| TransportError::tls(target, format!("opening {}: {e}", path.display())))
}

pub(crate) fn client_config(
    options: &TlsOptions,
    target: &str,
) -> Result<ClientConfig, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::tls(target, e))?;

    let builder = if options.verify {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots)
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
    };

    let mut config = match &options.cert {
        Some(cert) => {
            let (chain, key) = cert.load(target)?;
            builder
                .with_client_auth_cert(chain, key)
                .map_err(|e| TransportError::tls(target, e))?
        }
        None => builder.with_no_client_auth(),
    };
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    tracing::debug!(verify = options.verify, client_cert = options.cert.is_some(), "built TLS client config");
    Ok(config)
}

/// Verifier for `verify=false`: trusts any certificate, still checks signatures.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifying_config_advertises_http1() {
        let config = client_config(&TlsOptions::default(), "example.com:443")
            .expect("default TLS config should build");
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn unverified_config_builds() {
        let options = TlsOptions {
            verify: false,
            cert: None,
        };
        assert!(client_config(&options, "example.com:443").is_ok());
    }

    #[test]
    fn missing_client_cert_is_a_tls_error() {
        let options = TlsOptions {
            verify: true,
            cert: Some(ClientCert::new("/nonexistent/client.pem")),
        };
        match client_config(&options, "example.com:443") {
            Err(TransportError::Tls { target, .. }) => assert_eq!(target, "example.com:443"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
