//! HTTP API handlers.

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::RelayError;
use crate::metrics;
use crate::summary::{parse_ids, project, ItemSummaries};
use crate::upstream::UpstreamClient;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Client for both upstreams.
    pub upstream: UpstreamClient,
    /// Prometheus handle, present when `/metrics` is enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state without a metrics endpoint.
    pub fn new(upstream: UpstreamClient) -> Self {
        Self {
            upstream,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle to serve `/metrics` from.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Prometheus exposition handler.
pub async fn prometheus(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Forward a catalog details request and relay the upstream response as-is.
#[instrument(skip_all)]
pub async fn catalog_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    metrics::inc_relay_requests(metrics::ROUTE_CATALOG_DETAILS);

    let payload = detail_payload(&headers, &body)?;
    let raw = state.upstream.post_catalog_details(&payload).await?;

    let content_type = raw
        .content_type
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    Ok((raw.status, [(CONTENT_TYPE, content_type)], raw.body).into_response())
}

/// Filter the item details dataset down to the ids in the `ids` query.
#[instrument(skip_all)]
pub async fn item_details(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ItemSummaries>, RelayError> {
    metrics::inc_relay_requests(metrics::ROUTE_ITEM_DETAILS);

    let ids = parse_ids(&ids_param(query.as_deref().unwrap_or_default()));
    if ids.is_empty() {
        metrics::inc_summary_short_circuits();
        return Ok(Json(ItemSummaries::default()));
    }

    let dataset = state.upstream.fetch_item_details().await?;
    let summaries = project(&dataset, &ids);
    debug!(requested = ids.len(), found = summaries.len(), "item details projected");

    Ok(Json(summaries))
}

/// Decode the inbound detail body.
///
/// Only `application/json` is parsed; any other content type, or a
/// zero-length body, is forwarded as `{}`. A parsed body must be an object
/// or array, so whitespace alone is rejected.
fn detail_payload(headers: &HeaderMap, body: &[u8]) -> Result<Value, RelayError> {
    if !is_json(headers) || body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let first = body.iter().find(|b| !b.is_ascii_whitespace());
    if !matches!(first, Some(b'{') | Some(b'[')) {
        return Err(RelayError::InvalidBody(serde::de::Error::custom(
            "top-level JSON value must be an object or array",
        )));
    }

    serde_json::from_slice(body).map_err(RelayError::InvalidBody)
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json"
}

/// All `ids` values in the query, joined with commas.
fn ids_param(query: &str) -> String {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "ids")
        .map(|(_, value)| value.into_owned())
        .collect::<Vec<_>>()
        .join(",")
}
