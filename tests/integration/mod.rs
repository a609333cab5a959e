//! Integration tests for the relay.
//!
//! Each test starts an in-process mock upstream on a loopback port and drives
//! the relay router directly with `oneshot`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use roblox_relay::api::{create_router, AppState};
use roblox_relay::config::Config;
use roblox_relay::upstream::UpstreamClient;

/// Canned upstream response plus a record of what it received.
struct MockUpstream {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: String,
    calls: AtomicUsize,
    received: Mutex<Vec<(Option<String>, Bytes)>>,
}

impl MockUpstream {
    fn new(status: StatusCode, content_type: Option<&'static str>, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            status,
            content_type,
            body: body.into(),
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> (Option<String>, Bytes) {
        self.received.lock().unwrap().last().cloned().expect("upstream was not called")
    }
}

async fn mock_handler(
    State(mock): State<Arc<MockUpstream>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.received.lock().unwrap().push((content_type, body));

    let mut builder = Response::builder().status(mock.status);
    if let Some(ct) = mock.content_type {
        builder = builder.header(CONTENT_TYPE, ct);
    }
    builder.body(Body::from(mock.body.clone())).unwrap()
}

/// Serve the mock on an ephemeral loopback port.
async fn spawn_upstream(mock: Arc<MockUpstream>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(mock_handler).with_state(mock);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// An address nothing is listening on.
async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn relay(addr: SocketAddr) -> Router {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let upstream = UpstreamClient::with_http(
        http,
        format!("http://{addr}/v1/items/details"),
        format!("http://{addr}/itemapi/itemdetails"),
    );
    create_router(AppState::new(upstream), &Config::default()).unwrap()
}

async fn get(app: Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    split(response).await
}

async fn post(app: Router, content_type: Option<&str>, body: &str) -> (StatusCode, HeaderMap, Bytes) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/roblox/catalog/items/details");
    if let Some(ct) = content_type {
        request = request.header(CONTENT_TYPE, ct);
    }
    let response = app
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    split(response).await
}

async fn split(response: Response) -> (StatusCode, HeaderMap, Bytes) {
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

fn as_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn item_dataset() -> String {
    json!({
        "success": true,
        "item_count": 3,
        "items": {
            "2": ["Hat", 100, 150, 1, -1, -1, -1, -1, 1],
            "5": ["Widget", null, null],
            "9": ["Scarf", 50, 0]
        }
    })
    .to_string()
}

// === Summary filter ===

#[tokio::test]
async fn empty_or_malformed_ids_skip_upstream() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), item_dataset());
    let addr = spawn_upstream(mock.clone()).await;

    for uri in [
        "/rolimons/itemdetails",
        "/rolimons/itemdetails?ids=",
        "/rolimons/itemdetails?ids=abc,,0,-1",
        "/rolimons/itemdetails?ids=%20,%20",
        "/rolimons/itemdetails?other=5",
    ] {
        let (status, _, body) = get(relay(addr), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(as_json(&body), json!({}), "{uri}");
    }

    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn filters_and_projects_requested_ids() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), item_dataset());
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, body) = get(relay(addr), "/rolimons/itemdetails?ids=2,0,-5,notanumber,3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        r#"{"2":{"name":"Hat","rap":100,"value":150,"price":150}}"#
    );
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn repeated_ids_params_are_merged() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), item_dataset());
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, body) = get(relay(addr), "/rolimons/itemdetails?ids=5&ids=9").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        as_json(&body),
        json!({
            "5": {"name": "Widget", "rap": 0, "value": 0, "price": 0},
            "9": {"name": "Scarf", "rap": 50, "value": 0, "price": 50}
        })
    );
    let (_, request_body) = mock.last_request();
    assert!(request_body.is_empty());
}

#[tokio::test]
async fn upstream_failure_status_is_relayed() {
    let mock = MockUpstream::new(StatusCode::SERVICE_UNAVAILABLE, Some("text/html"), "<h1>down</h1>");
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, body) = get(relay(addr), "/rolimons/itemdetails?ids=2").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(as_json(&body), json!({"error": "Rolimons upstream failed"}));
}

#[tokio::test]
async fn unreachable_item_upstream_is_bad_gateway() {
    let addr = dead_address().await;

    let (status, _, body) = get(relay(addr), "/rolimons/itemdetails?ids=2").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body = as_json(&body);
    assert_eq!(body["error"], "Upstream error");
    assert!(!body["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_upstream_json_is_bad_gateway() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), "{\"items\": ");
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, body) = get(relay(addr), "/rolimons/itemdetails?ids=2").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(as_json(&body)["error"], "Upstream error");
}

#[tokio::test]
async fn null_upstream_document_is_bad_gateway() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), "null");
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, body) = get(relay(addr), "/rolimons/itemdetails?ids=2").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(as_json(&body)["error"], "Upstream error");
}

#[tokio::test]
async fn large_ids_match_upstream_keys() {
    let dataset = json!({"items": {"123456789012345680000": ["Big", 5, 7]}}).to_string();
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), dataset);
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, body) = get(relay(addr), "/rolimons/itemdetails?ids=123456789012345680000").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        as_json(&body),
        json!({"123456789012345680000": {"name": "Big", "rap": 5, "value": 7, "price": 7}})
    );
}

// === Detail relay ===

#[tokio::test]
async fn detail_response_is_relayed_verbatim() {
    let mock = MockUpstream::new(StatusCode::CREATED, Some("application/json"), r#"{"ok":true}"#);
    let addr = spawn_upstream(mock.clone()).await;

    let (status, headers, body) = post(
        relay(addr),
        Some("application/json"),
        r#"{"items":[{"itemType":"Asset","id":1}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert_eq!(&body[..], br#"{"ok":true}"#);

    let (content_type, forwarded) = mock.last_request();
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        std::str::from_utf8(&forwarded).unwrap(),
        r#"{"items":[{"itemType":"Asset","id":1}]}"#
    );
}

#[tokio::test]
async fn empty_detail_body_forwards_empty_object() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), "{}");
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, _) = post(relay(addr), Some("application/json"), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&mock.last_request().1[..], b"{}");

    let (status, _, _) = post(relay(addr), None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&mock.last_request().1[..], b"{}");

    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn detail_error_status_and_raw_text_pass_through() {
    let mock = MockUpstream::new(StatusCode::TOO_MANY_REQUESTS, None, "Too many requests, slow down");
    let addr = spawn_upstream(mock.clone()).await;

    let (status, headers, body) = post(relay(addr), Some("application/json"), r#"{"items":[]}"#).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert_eq!(&body[..], b"Too many requests, slow down");
}

#[tokio::test]
async fn detail_upstream_content_type_is_kept() {
    let mock = MockUpstream::new(StatusCode::OK, Some("text/plain; charset=utf-8"), "plain");
    let addr = spawn_upstream(mock.clone()).await;

    let (_, headers, body) = post(relay(addr), Some("application/json"), "{}").await;

    assert_eq!(headers[CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(&body[..], b"plain");
}

#[tokio::test]
async fn unreachable_detail_upstream_is_bad_gateway() {
    let addr = dead_address().await;

    let (status, _, body) = post(relay(addr), Some("application/json"), "{}").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body = as_json(&body);
    assert_eq!(body["error"], "Upstream error");
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn malformed_detail_body_never_reaches_upstream() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), "{}");
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, _) = post(relay(addr), Some("application/json"), "{\"items\":").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn whitespace_detail_body_is_rejected() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), "{}");
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, _) = post(relay(addr), Some("application/json"), "   ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn vendor_json_detail_body_is_not_parsed() {
    let mock = MockUpstream::new(StatusCode::OK, Some("application/json"), "{}");
    let addr = spawn_upstream(mock.clone()).await;

    let (status, _, _) = post(relay(addr), Some("application/vnd.api+json"), r#"{"items":[1]}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&mock.last_request().1[..], b"{}");
}
