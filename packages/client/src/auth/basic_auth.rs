//! Basic authentication

use std::fmt;
use std::io::Write;

use base64::prelude::BASE64_STANDARD;
use base64::write::EncoderWriter;
use http::header::AUTHORIZATION;
use http::HeaderValue;

use super::AuthProvider;
use crate::error::{self, Result};
use crate::http::HeaderList;

/// Build a `Basic` authorization header value, marked sensitive.
///
/// # Errors
///
/// Fails with an invalid-request error when the credentials contain bytes
/// that cannot appear in a header.
pub fn basic_auth<U, P>(username: U, password: Option<P>) -> Result<HeaderValue>
where
    U: fmt::Display,
    P: fmt::Display,
{
    let mut buf = b"Basic ".to_vec();
    {
        let mut encoder = EncoderWriter::new(&mut buf, &BASE64_STANDARD);
        let _ = write!(encoder, "{username}:");
        if let Some(password) = password {
            let _ = write!(encoder, "{password}");
        }
    }
    let mut header = HeaderValue::from_bytes(&buf).map_err(error::invalid_header)?;
    header.set_sensitive(true);
    Ok(header)
}

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: Option<String>,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl AuthProvider for BasicAuth {
    fn apply(&self, headers: &mut HeaderList) -> Result<()> {
        headers.set(AUTHORIZATION, basic_auth(&self.username, self.password.as_ref())?);
        Ok(())
    }

    fn auth_type(&self) -> &'static str {
        "Basic"
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_credentials() {
        let value = basic_auth("Aladdin", Some("open sesame")).expect("valid credentials");
        assert_eq!(value, "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
        assert!(value.is_sensitive());

        let value = basic_auth("user", None::<&str>).expect("valid credentials");
        assert_eq!(value, "Basic dXNlcjo=");
    }

    #[test]
    fn applies_authorization_header() {
        let mut headers = HeaderList::new();
        BasicAuth::new("u", Some("p".to_string()))
            .apply(&mut headers)
            .expect("auth applies");
        assert_eq!(headers.get_str("authorization"), Some("Basic dTpw"));
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", BasicAuth::new("u", Some("hunter2".to_string())));
        assert!(!rendered.contains("hunter2"));
    }
}
