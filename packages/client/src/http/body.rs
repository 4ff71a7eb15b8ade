//! Request body encoding: raw bytes, url-encoded forms and multipart uploads.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{self, Result};

/// The `data` of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    /// Sent as-is.
    Bytes(Bytes),
    /// Sent as UTF-8, no content type implied.
    Text(String),
    /// Sent `application/x-www-form-urlencoded`, or as multipart fields next to files.
    Form(Vec<(String, String)>),
}

impl Data {
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Data::Form(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<&str> for Data {
    fn from(text: &str) -> Self {
        Data::Text(text.to_string())
    }
}

impl From<String> for Data {
    fn from(text: String) -> Self {
        Data::Text(text)
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data::Bytes(Bytes::from(bytes))
    }
}

impl From<Bytes> for Data {
    fn from(bytes: Bytes) -> Self {
        Data::Bytes(bytes)
    }
}

impl From<&'static [u8]> for Data {
    fn from(bytes: &'static [u8]) -> Self {
        Data::Bytes(Bytes::from_static(bytes))
    }
}

/// One file of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    content: Bytes,
}

impl FilePart {
    pub fn new(field: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            field: field.into(),
            file_name: None,
            content_type: None,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }
}

/// An encoded body and the `Content-Type` it implies, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EncodedBody {
    pub(crate) bytes: Bytes,
    pub(crate) content_type: Option<String>,
}

/// Encode `data` and `files` into a single body.
///
/// Files force `multipart/form-data`; form fields then travel as parts too.
pub(crate) fn encode(data: Option<&Data>, files: &[FilePart]) -> Result<Option<EncodedBody>> {
    if !files.is_empty() {
        let fields: &[(String, String)] = match data {
            None => &[],
            Some(Data::Form(fields)) => fields,
            Some(_) => {
                return Err(error::invalid_request(
                    "a raw body cannot be combined with file uploads",
                ))
            }
        };
        return Ok(Some(encode_multipart(fields, files, &boundary())));
    }

    let encoded = match data {
        None => return Ok(None),
        Some(Data::Bytes(bytes)) => EncodedBody {
            bytes: bytes.clone(),
            content_type: None,
        },
        Some(Data::Text(text)) => EncodedBody {
            bytes: Bytes::from(text.clone()),
            content_type: None,
        },
        Some(Data::Form(fields)) => EncodedBody {
            bytes: Bytes::from(serde_urlencoded::to_string(fields).map_err(error::invalid_request)?),
            content_type: Some("application/x-www-form-urlencoded".to_string()),
        },
    };
    Ok(Some(encoded))
}

fn boundary() -> String {
    format!("{:016x}{:016x}", fastrand::u64(..), fastrand::u64(..))
}

fn encode_multipart(fields: &[(String, String)], files: &[FilePart], boundary: &str) -> EncodedBody {
    let mut buf = BytesMut::new();

    for (name, value) in fields {
        put_part_head(&mut buf, boundary, name, None, None);
        buf.put_slice(value.as_bytes());
        buf.put_slice(b"\r\n");
    }

    for file in files {
        let file_name = file.file_name.as_deref().unwrap_or(&file.field);
        let content_type = file
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        put_part_head(&mut buf, boundary, &file.field, Some(file_name), Some(content_type));
        buf.put_slice(&file.content);
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(format!("--{boundary}--\r\n").as_bytes());

    EncodedBody {
        bytes: buf.freeze(),
        content_type: Some(format!("multipart/form-data; boundary={boundary}")),
    }
}

fn put_part_head(
    buf: &mut BytesMut,
    boundary: &str,
    name: &str,
    file_name: Option<&str>,
    content_type: Option<&str>,
) {
    buf.put_slice(format!("--{boundary}\r\n").as_bytes());
    buf.put_slice(
        format!("Content-Disposition: form-data; name=\"{}\"", escape_quoted(name)).as_bytes(),
    );
    if let Some(file_name) = file_name {
        buf.put_slice(format!("; filename=\"{}\"", escape_quoted(file_name)).as_bytes());
    }
    buf.put_slice(b"\r\n");
    if let Some(content_type) = content_type {
        buf.put_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    }
    buf.put_slice(b"\r\n");
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
