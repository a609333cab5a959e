//! HTTP client for the catalog and item details upstreams.

use std::time::Instant;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{ConfigError, RelayError};
use crate::metrics;

/// Upstream response kept as raw bytes.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Status returned by the upstream.
    pub status: StatusCode,
    /// Content type returned by the upstream, if any.
    pub content_type: Option<HeaderValue>,
    /// Body, unmodified.
    pub body: Bytes,
}

/// Client for both upstreams. Cheap to clone; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Catalog item details endpoint (POST).
    catalog_details_url: String,
    /// Bulk item details endpoint (GET).
    item_details_url: String,
}

impl UpstreamClient {
    /// Create a client from config.
    ///
    /// No timeout is applied unless configured: reqwest then waits on the
    /// upstream indefinitely and connect attempts are bounded only by the OS.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder()
            .tcp_nodelay(true)
            .pool_idle_timeout(std::time::Duration::from_secs(90));

        if let Some(timeout) = config.upstream_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.upstream_connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self::with_http(
            builder.build()?,
            config.catalog_details_url.clone(),
            config.item_details_url.clone(),
        ))
    }

    /// Create a client around an existing reqwest client.
    pub fn with_http(
        http: reqwest::Client,
        catalog_details_url: impl Into<String>,
        item_details_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            catalog_details_url: catalog_details_url.into(),
            item_details_url: item_details_url.into(),
        }
    }

    /// POST a JSON body to the catalog details endpoint and return the
    /// response untouched.
    #[instrument(skip_all, fields(url = %self.catalog_details_url))]
    pub async fn post_catalog_details(&self, body: &Value) -> Result<RawResponse, RelayError> {
        let payload = serde_json::to_vec(body)?;
        let start = Instant::now();

        let result = async {
            let response = self
                .http
                .post(&self.catalog_details_url)
                .header(CONTENT_TYPE, "application/json")
                .body(payload)
                .send()
                .await?;

            let status = response.status();
            let content_type = response.headers().get(CONTENT_TYPE).cloned();
            let body = response.bytes().await?;

            Ok::<_, reqwest::Error>(RawResponse {
                status,
                content_type,
                body,
            })
        }
        .await;

        metrics::record_upstream_latency(metrics::ROUTE_CATALOG_DETAILS, start);

        match result {
            Ok(raw) => {
                debug!(status = %raw.status, bytes = raw.body.len(), "catalog details relayed");
                Ok(raw)
            }
            Err(e) => {
                warn!(error = %e, "catalog details upstream failed");
                metrics::inc_upstream_failures(metrics::ROUTE_CATALOG_DETAILS);
                Err(e.into())
            }
        }
    }

    /// GET the full item details dataset and parse it as JSON.
    ///
    /// A non-success status is reported without reading the body. A `null`
    /// document is a decode failure.
    #[instrument(skip_all, fields(url = %self.item_details_url))]
    pub async fn fetch_item_details(&self) -> Result<Value, RelayError> {
        let start = Instant::now();
        let result = self.fetch_item_details_inner().await;
        metrics::record_upstream_latency(metrics::ROUTE_ITEM_DETAILS, start);

        if let Err(e) = &result {
            warn!(error = %e, "item details upstream failed");
            metrics::inc_upstream_failures(metrics::ROUTE_ITEM_DETAILS);
        }
        result
    }

    async fn fetch_item_details_inner(&self) -> Result<Value, RelayError> {
        let response = self.http.get(&self.item_details_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::ItemDetailsStatus(status));
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "item details fetched");
        let dataset: Value = serde_json::from_slice(&body)?;

        // `items` cannot be read off a null document.
        if dataset.is_null() {
            return Err(RelayError::Decode(serde::de::Error::custom(
                "item details payload is null",
            )));
        }
        Ok(dataset)
    }
}
