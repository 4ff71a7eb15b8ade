//! Header handling across redirect hops.

use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HOST, PROXY_AUTHORIZATION};
use url::Url;

use crate::http::{target, HeaderList};

/// Headers that identify the client to one particular host.
const HOST_SPECIFIC: [http::HeaderName; 4] = [HOST, AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION];

/// Headers describing a body that is no longer sent.
const BODY_DESCRIBING: [http::HeaderName; 2] = [CONTENT_TYPE, CONTENT_LENGTH];

/// Whether a hop from `previous` to `next` leaves the host (or port).
pub(crate) fn is_cross_host(previous: &Url, next: &Url) -> bool {
    !target::same_host(previous, next)
}

/// Remove credentials and host-bound headers when redirecting across hosts.
pub(crate) fn remove_sensitive_headers(headers: &mut HeaderList, previous: &Url, next: &Url) {
    if is_cross_host(previous, next) {
        for name in &HOST_SPECIFIC {
            headers.remove(name);
        }
        headers.remove("cookie2");
    }
}

/// Remove the headers of a body dropped by a method downgrade.
pub(crate) fn remove_body_headers(headers: &mut HeaderList) {
    for name in &BODY_DESCRIBING {
        headers.remove(name);
    }
}
