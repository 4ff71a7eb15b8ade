//! Proxy selection
//!
//! Explicit proxies are given per URL scheme (`"http"`, `"https"`) or for
//! every scheme (`"all"`). Without a match, and when `trust_env` is set, the
//! usual environment variables are consulted. Plain `http` requests are
//! forwarded through the proxy in absolute form; `https` requests tunnel
//! through it with `CONNECT`.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use url::Url;

pub mod environment;

pub use environment::{Environment, SystemEnvironment};

use crate::error::{self, Result};
use crate::http::target;

/// Key matching every scheme in a proxy map.
pub const ALL: &str = "all";

/// Choose the proxy for `url`.
///
/// `layers` are explicit proxy maps, highest precedence first. Each layer is
/// searched by scheme and then for [`ALL`] before the next one is consulted.
///
/// # Errors
///
/// Fails with an invalid-request error when the chosen proxy URL does not
/// parse or uses a scheme other than `http`.
pub fn select(
    url: &Url,
    layers: &[&[(String, String)]],
    env: Option<&dyn Environment>,
) -> Result<Option<Url>> {
    let scheme = url.scheme();
    let configured = layers
        .iter()
        .find_map(|explicit| lookup(explicit, scheme).or_else(|| lookup(explicit, ALL)));
    if let Some(proxy) = configured {
        return parse_proxy(proxy).map(Some);
    }

    let Some(env) = env else {
        return Ok(None);
    };
    let host = target::dial_host(url)?;
    if env.bypasses(&host) {
        tracing::trace!(%host, "host matches no_proxy");
        return Ok(None);
    }
    match env.proxy_for(scheme) {
        Some(proxy) => parse_proxy(&proxy).map(Some),
        None => Ok(None),
    }
}

fn lookup<'a>(explicit: &'a [(String, String)], scheme: &str) -> Option<&'a str> {
    explicit
        .iter()
        .rev()
        .find(|(key, _)| key.eq_ignore_ascii_case(scheme))
        .map(|(_, proxy)| proxy.as_str())
}

/// Parse a proxy URL; a bare `host:port` means `http://host:port`.
pub(crate) fn parse_proxy(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let proxy = Url::parse(&with_scheme)
        .map_err(|e| error::invalid_request(format!("invalid proxy URL `{raw}`: {e}")))?;
    if proxy.scheme() != "http" {
        return Err(error::invalid_request(format!(
            "unsupported proxy scheme `{}` in `{raw}`",
            proxy.scheme()
        )));
    }
    if proxy.host().is_none() {
        return Err(error::invalid_request(format!("proxy URL has no host: `{raw}`")));
    }
    Ok(proxy)
}

/// `Basic` credentials from the proxy URL's userinfo, if any.
pub(crate) fn basic_credentials(proxy: &Url) -> Option<String> {
    if proxy.username().is_empty() && proxy.password().is_none() {
        return None;
    }
    let decode = |part: &str| {
        urlencoding::decode(part)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| part.to_string())
    };
    let username = decode(proxy.username());
    let password = proxy.password().map(decode).unwrap_or_default();
    Some(format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{username}:{password}"))
    ))
}
