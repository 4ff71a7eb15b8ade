//! `Content-Encoding` decoding for received bodies.
//!
//! Bodies are read in full before decoding, so each coding is a plain
//! `Read` adapter over the collected bytes. Codings are undone in reverse of
//! the order the server listed them. A response carrying a coding this
//! module does not know is handed back untouched.

use std::io::{Cursor, Read};

use bytes::Bytes;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH};

use crate::error::{self, Result};

/// Codings advertised in the default `Accept-Encoding` header.
pub const SUPPORTED: [&str; 3] = ["gzip", "deflate", "br"];

/// Upper bound on a decoded body (64MB).
const DECODE_LIMIT: u64 = 64 * 1024 * 1024;

const BROTLI_BUFFER: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coding {
    Gzip,
    Deflate,
    Brotli,
    Identity,
}

impl Coding {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Some(Coding::Gzip),
            "deflate" => Some(Coding::Deflate),
            "br" => Some(Coding::Brotli),
            "identity" | "" => Some(Coding::Identity),
            _ => None,
        }
    }
}

/// Undo the `Content-Encoding` of `response`, dropping the headers that
/// described the encoded body.
///
/// # Errors
///
/// A body that does not decode, or decodes past the size limit, is a
/// protocol error.
pub(crate) fn decode(response: http::Response<Bytes>) -> Result<http::Response<Bytes>> {
    let Some(codings) = codings(response.headers()) else {
        return Ok(response);
    };
    if codings.iter().all(|coding| *coding == Coding::Identity) {
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let mut body = body;
    if !body.is_empty() {
        for coding in codings.iter().rev() {
            body = decode_one(*coding, &body)?;
        }
    }
    parts.headers.remove(CONTENT_ENCODING);
    parts.headers.remove(CONTENT_LENGTH);
    Ok(http::Response::from_parts(parts, body))
}

/// The listed codings, or `None` when there are none or one is unknown.
fn codings(headers: &http::HeaderMap) -> Option<Vec<Coding>> {
    let mut codings = Vec::new();
    for value in headers.get_all(CONTENT_ENCODING) {
        let value = value.to_str().ok()?;
        for token in value.split(',') {
            match Coding::parse(token) {
                Some(coding) => codings.push(coding),
                None => {
                    tracing::debug!(
                        coding = token.trim(),
                        "leaving body with unknown content coding"
                    );
                    return None;
                }
            }
        }
    }
    (!codings.is_empty()).then_some(codings)
}

fn decode_one(coding: Coding, data: &[u8]) -> Result<Bytes> {
    let cursor = Cursor::new(data);
    match coding {
        Coding::Identity => Ok(Bytes::copy_from_slice(data)),
        Coding::Gzip => read_limited(GzDecoder::new(cursor), "gzip"),
        // `deflate` is zlib-wrapped per RFC 9110, but raw streams are common.
        Coding::Deflate if has_zlib_header(data) => {
            read_limited(ZlibDecoder::new(cursor), "deflate")
        }
        Coding::Deflate => read_limited(DeflateDecoder::new(cursor), "deflate"),
        Coding::Brotli => read_limited(brotli::Decompressor::new(cursor, BROTLI_BUFFER), "br"),
    }
}

fn has_zlib_header(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => (cmf & 0x0f) == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

fn read_limited<R: Read>(decoder: R, coding: &str) -> Result<Bytes> {
    let mut decoded = Vec::new();
    decoder
        .take(DECODE_LIMIT + 1)
        .read_to_end(&mut decoded)
        .map_err(|e| error::protocol(format!("invalid {coding} body: {e}")))?;
    if decoded.len() as u64 > DECODE_LIMIT {
        return Err(error::protocol(format!(
            "decoded {coding} body exceeds {DECODE_LIMIT} bytes"
        )));
    }
    Ok(Bytes::from(decoded))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;

    use super::*;

    const TEXT: &[u8] = b"hello courier, hello courier, hello courier";

    fn encoded(coding: &str, body: Vec<u8>) -> http::Response<Bytes> {
        http::Response::builder()
            .header(CONTENT_ENCODING, coding)
            .header(CONTENT_LENGTH, body.len())
            .body(Bytes::from(body))
            .expect("valid test response")
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).expect("gzip write");
        encoder.finish().expect("gzip finish")
    }

    #[test]
    fn gzip_body_is_decoded_and_headers_dropped() {
        let decoded = decode(encoded("gzip", gzip(TEXT))).expect("gzip should decode");
        assert_eq!(decoded.body().as_ref(), TEXT);
        assert!(decoded.headers().get(CONTENT_ENCODING).is_none());
        assert!(decoded.headers().get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn deflate_accepts_zlib_and_raw_streams() {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(TEXT).expect("zlib write");
        let zlib = zlib.finish().expect("zlib finish");
        let decoded = decode(encoded("deflate", zlib)).expect("zlib should decode");
        assert_eq!(decoded.body().as_ref(), TEXT);

        let mut raw = DeflateEncoder::new(Vec::new(), Compression::default());
        raw.write_all(TEXT).expect("deflate write");
        let raw = raw.finish().expect("deflate finish");
        let decoded = decode(encoded("deflate", raw)).expect("raw deflate should decode");
        assert_eq!(decoded.body().as_ref(), TEXT);
    }

    #[test]
    fn brotli_body_is_decoded() {
        let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 5, 22);
        writer.write_all(TEXT).expect("brotli write");
        let compressed = writer.into_inner();

        let decoded = decode(encoded("br", compressed)).expect("brotli should decode");
        assert_eq!(decoded.body().as_ref(), TEXT);
    }

    #[test]
    fn stacked_codings_are_undone_in_reverse() {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(TEXT).expect("zlib write");
        let twice = gzip(&zlib.finish().expect("zlib finish"));

        let decoded = decode(encoded("deflate, gzip", twice)).expect("both codings decode");
        assert_eq!(decoded.body().as_ref(), TEXT);
    }

    #[test]
    fn unknown_coding_is_left_alone() {
        let decoded =
            decode(encoded("compress", b"\x1f\x9d...".to_vec())).expect("passes through");
        assert_eq!(decoded.body().as_ref(), b"\x1f\x9d...");
        assert_eq!(decoded.headers()[CONTENT_ENCODING], "compress");
    }

    #[test]
    fn empty_body_keeps_nothing_to_decode() {
        let decoded = decode(encoded("gzip", Vec::new())).expect("HEAD-style reply");
        assert!(decoded.body().is_empty());
    }

    #[test]
    fn corrupt_body_is_a_protocol_error() {
        let err = decode(encoded("gzip", b"not gzip at all".to_vec())).expect_err("corrupt gzip");
        assert!(err.is_protocol());
    }
}
