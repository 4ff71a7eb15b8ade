//! `request` and its verb-named shorthands.

use courier_client::{Data, Method, RequestOptions, Response, Result};

use crate::adhoc::AdhocSession;
use crate::safe_mode;

/// Send a request and return its final response.
///
/// Runs on the session in `options` when one is set and on a fresh ad-hoc
/// session otherwise; the ad-hoc session is closed before this returns.
/// `allow_redirects` defaults to true for every method but `HEAD`.
///
/// # Errors
///
/// Any error of [`courier_client::Session::request`], unless `safe_mode` is
/// in effect: the error is then returned inside an `Ok` [`Response`] whose
/// status is `None`.
pub async fn request(
    method: Method,
    url: impl AsRef<str>,
    mut options: RequestOptions,
) -> Result<Response> {
    let url = url.as_ref();
    match options.take_session() {
        Some(session) => {
            log::debug!("{method} {url} on caller session");
            let safe = safe_mode::enabled(&session, options.config_overrides());
            safe_mode::settle(safe, session.request(method, url, options).await)
        }
        None => {
            log::debug!("{method} {url} on ad-hoc session");
            let session = AdhocSession::new();
            let safe = safe_mode::enabled(&session, options.config_overrides());
            safe_mode::settle(safe, session.request(method, url, options).await)
        }
    }
}

/// Send a `GET` request.
///
/// # Errors
///
/// See [`request`].
pub async fn get(url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
    request(Method::Get, url, options).await
}

/// Send an `OPTIONS` request.
///
/// # Errors
///
/// See [`request`].
pub async fn options(url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
    request(Method::Options, url, options).await
}

/// Send a `HEAD` request; redirects are not followed unless enabled.
///
/// # Errors
///
/// See [`request`].
pub async fn head(url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
    request(Method::Head, url, options).await
}

/// Send a `POST` request with an optional body.
///
/// # Errors
///
/// See [`request`].
pub async fn post(
    url: impl AsRef<str>,
    data: Option<Data>,
    options: RequestOptions,
) -> Result<Response> {
    request(Method::Post, url, with_data(options, data)).await
}

/// Send a `PUT` request with an optional body.
///
/// # Errors
///
/// See [`request`].
pub async fn put(
    url: impl AsRef<str>,
    data: Option<Data>,
    options: RequestOptions,
) -> Result<Response> {
    request(Method::Put, url, with_data(options, data)).await
}

/// Send a `PATCH` request with an optional body.
///
/// # Errors
///
/// See [`request`].
pub async fn patch(
    url: impl AsRef<str>,
    data: Option<Data>,
    options: RequestOptions,
) -> Result<Response> {
    request(Method::Patch, url, with_data(options, data)).await
}

/// Send a `DELETE` request.
///
/// # Errors
///
/// See [`request`].
pub async fn delete(url: impl AsRef<str>, options: RequestOptions) -> Result<Response> {
    request(Method::Delete, url, options).await
}

fn with_data(options: RequestOptions, data: Option<Data>) -> RequestOptions {
    match data {
        Some(data) => options.data(data),
        None => options,
    }
}
