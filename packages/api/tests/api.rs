use std::net::SocketAddr;

use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode as AxumStatus};
use axum::response::IntoResponse;
use axum::routing::{any, get, post};
use axum::Router;
use courier::{Data, RequestOptions, StatusCode};
use serde_json::json;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

async fn found() -> impl IntoResponse {
    (AxumStatus::FOUND, [(header::LOCATION, "/b")])
}

async fn echo_method(method: axum::http::Method, body: String) -> String {
    format!("{method} {body}")
}

async fn status(Path(code): Path<u16>) -> AxumStatus {
    AxumStatus::from_u16(code).unwrap_or(AxumStatus::BAD_REQUEST)
}

async fn set_cookie() -> impl IntoResponse {
    ([(header::SET_COOKIE, "visited=yes; Path=/")], "set")
}

async fn echo_cookie(headers: HeaderMap) -> String {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

async fn serve() -> String {
    let app = Router::new()
        .route("/a", get(found))
        .route("/b", get(|| async { "done" }))
        .route("/echo", any(echo_method))
        .route("/form", post(|body: String| async move { body }))
        .route("/status/:code", get(status))
        .route("/cookie/set", get(set_cookie))
        .route("/cookie/echo", get(echo_cookie));

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

fn no_env() -> RequestOptions {
    RequestOptions::new().config("trust_env", false)
}

#[tokio::test]
async fn test_get_follows_found_redirect() {
    init_logging();
    let base = serve().await;

    let response = courier::get(format!("{base}/a"), no_env())
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), Some(StatusCode::OK));
    assert_eq!(response.text(), "done");
    let history: Vec<_> = response.history().iter().map(|r| r.status()).collect();
    assert_eq!(history, [Some(StatusCode::FOUND)]);
}

#[tokio::test]
async fn test_head_does_not_follow_redirects() {
    init_logging();
    let base = serve().await;

    let response = courier::head(format!("{base}/a"), no_env())
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), Some(StatusCode::FOUND));
    assert!(response.history().is_empty());
}

#[tokio::test]
async fn test_verbs_carry_their_bodies() {
    init_logging();
    let base = serve().await;

    let response = courier::post(format!("{base}/form"), Some(Data::form([("a", "1"), ("b", "two words")])), no_env())
        .await
        .expect("request should succeed");
    assert_eq!(response.text(), "a=1&b=two+words");

    let response = courier::put(format!("{base}/echo"), Some(Data::from("payload")), no_env())
        .await
        .expect("request should succeed");
    assert_eq!(response.text(), "PUT payload");

    let response = courier::patch(format!("{base}/echo"), None, no_env())
        .await
        .expect("request should succeed");
    assert_eq!(response.text(), "PATCH ");

    let response = courier::delete(format!("{base}/echo"), no_env())
        .await
        .expect("request should succeed");
    assert_eq!(response.text(), "DELETE ");

    let response = courier::options(format!("{base}/echo"), no_env())
        .await
        .expect("request should succeed");
    assert_eq!(response.text(), "OPTIONS ");
}

#[tokio::test]
async fn test_shared_session_keeps_cookies() {
    init_logging();
    let base = serve().await;
    let session = courier::session();

    courier::get(format!("{base}/cookie/set"), no_env().session(session.clone()))
        .await
        .expect("request should succeed");
    let response = courier::get(format!("{base}/cookie/echo"), no_env().session(session.clone()))
        .await
        .expect("request should succeed");
    assert_eq!(response.text(), "visited=yes");
    assert!(!session.is_closed());

    let response = courier::get(format!("{base}/cookie/echo"), no_env())
        .await
        .expect("request should succeed");
    assert_eq!(response.text(), "none");
    session.close();
}

#[tokio::test]
async fn test_connection_refused_surfaces_connect_error() {
    init_logging();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);

    let err = courier::get(format!("http://{addr}/"), no_env())
        .await
        .expect_err("nothing listens");
    assert!(err.is_connect());
    assert_eq!(err.attempts(), 1);
}

#[tokio::test]
async fn test_safe_mode_returns_error_responses() {
    init_logging();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);

    let response = courier::get(format!("http://{addr}/"), no_env().config("safe_mode", true))
        .await
        .expect("safe mode never fails");
    assert_eq!(response.status(), None);
    assert!(!response.ok());
    assert!(response.error().is_some_and(courier::Error::is_connect));

    let err = courier::get(
        format!("http://{addr}/"),
        no_env().config_map(
            json!({ "safe_mode": true, "danger_mode": true })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        ),
    )
    .await
    .expect_err("danger_mode wins over safe_mode");
    assert!(err.is_connect());
}

#[tokio::test]
async fn test_danger_mode_raises_for_status() {
    init_logging();
    let base = serve().await;

    let response = courier::get(format!("{base}/status/500"), no_env())
        .await
        .expect("statuses are responses by default");
    assert_eq!(response.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));

    let err = courier::get(format!("{base}/status/500"), no_env().config("danger_mode", true))
        .await
        .expect_err("danger mode raises");
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    init_logging();
    let err = courier::get("ftp://example.com/file", no_env())
        .await
        .expect_err("unsupported scheme");
    assert!(err.is_invalid_request());
    assert_eq!(courier::defaults().max_redirects(), 30);
}
