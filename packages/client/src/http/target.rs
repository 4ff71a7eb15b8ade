//! Request target handling on top of `url::Url`.

use std::borrow::Cow;

use url::{Host, Url};

use crate::config::SCHEMES;
use crate::error::{self, Result};

/// Parse a request URL, accepting only `http` and `https` with a host.
///
/// # Errors
///
/// Returns an invalid-request error for unparsable URLs, other schemes and
/// host-less URLs.
pub fn parse(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())
        .map_err(|e| error::invalid_url(format!("invalid URL `{input}`: {e}")))?;
    check(&url)?;
    Ok(url)
}

/// Validate an already-parsed URL the way [`parse`] does.
///
/// # Errors
///
/// See [`parse`].
pub fn check(url: &Url) -> Result<()> {
    if !SCHEMES.contains(&url.scheme()) {
        return Err(error::invalid_url(format!(
            "unsupported URL scheme `{}` in {url}",
            url.scheme()
        )));
    }
    if url.host().is_none() {
        return Err(error::invalid_url(format!("URL has no host: {url}")));
    }
    Ok(())
}

/// Host to dial, without the brackets `Url::host_str` keeps around IPv6 literals.
pub(crate) fn dial_host(url: &Url) -> Result<String> {
    match url.host() {
        Some(Host::Domain(domain)) => Ok(domain.to_ascii_lowercase()),
        Some(Host::Ipv4(addr)) => Ok(addr.to_string()),
        Some(Host::Ipv6(addr)) => Ok(addr.to_string()),
        None => Err(error::invalid_url(format!("URL has no host: {url}"))),
    }
}

/// The port to dial, falling back to the scheme default.
pub(crate) fn dial_port(url: &Url) -> Result<u16> {
    url.port_or_known_default()
        .ok_or_else(|| error::invalid_url(format!("URL has no known port: {url}")))
}

/// `Host` header value: host plus the port when it is not the scheme default.
pub(crate) fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Whether two URLs reach the same host and port.
pub(crate) fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str().map(str::to_ascii_lowercase) == b.host_str().map(str::to_ascii_lowercase)
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Append query parameters, form-encoded when `encode` is set and verbatim otherwise.
pub(crate) fn append_params(url: &mut Url, params: &[(String, String)], encode: bool) {
    if params.is_empty() {
        return;
    }
    if encode {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(key, value)| (key.as_str(), value.as_str())));
        return;
    }

    let raw = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{raw}"),
        _ => raw,
    };
    url.set_query(Some(&query));
}

/// Strip `user:password@` from `url`, returning the decoded credentials.
pub(crate) fn take_credentials(url: &mut Url) -> Option<(String, Option<String>)> {
    if url.username().is_empty() && url.password().is_none() {
        return None;
    }
    let username = decode(url.username()).into_owned();
    let password = url.password().map(|password| decode(password).into_owned());
    // Only fails for URLs that cannot carry credentials, which `check` already rejected.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    Some((username, password))
}

fn decode(component: &str) -> Cow<'_, str> {
    urlencoding::decode(component).unwrap_or(Cow::Borrowed(component))
}

/// The URL an early failure is reported against: `input` as parsed, minus
/// credentials, or `None` when it does not parse at all.
pub(crate) fn context_url(input: &str) -> Option<Url> {
    let mut url = Url::parse(input.trim()).ok()?;
    let _ = url.set_username("");
    let _ = url.set_password(None);
    Some(url)
}

/// Origin-form request target: path plus query.
pub(crate) fn origin_form(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

/// Absolute-form request target for forwarding proxies: no fragment, no credentials.
pub(crate) fn absolute_form(url: &Url) -> String {
    let mut absolute = url.clone();
    absolute.set_fragment(None);
    let _ = absolute.set_username("");
    let _ = absolute.set_password(None);
    absolute.into()
}
