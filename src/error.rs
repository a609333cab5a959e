//! Unified error types for the relay.

use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Error envelope message for upstream transport and decode failures.
pub const UPSTREAM_ERROR: &str = "Upstream error";

/// Error envelope message for a non-success item details status.
pub const ITEM_DETAILS_FAILED: &str = "Rolimons upstream failed";

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment could not be deserialized.
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),

    /// A value was present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// HTTP client could not be built from the configuration.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Per-request failures, each rendered as a JSON error response.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Upstream could not be reached or its response could not be read.
    #[error("{}", error_chain(.0))]
    Transport(#[from] reqwest::Error),

    /// Upstream body was not valid JSON.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// Item details upstream answered with a non-success status.
    #[error("item details upstream returned {0}")]
    ItemDetailsStatus(StatusCode),

    /// Inbound request body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidBody(serde_json::Error),
}

impl RelayError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Transport(_) | Self::Decode(_) => StatusCode::BAD_GATEWAY,
            Self::ItemDetailsStatus(status) => *status,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Transport(_) | Self::Decode(_) => {
                json!({ "error": UPSTREAM_ERROR, "detail": self.to_string() })
            }
            Self::ItemDetailsStatus(_) => json!({ "error": ITEM_DETAILS_FAILED }),
            Self::InvalidBody(e) => json!({ "error": "Invalid JSON body", "detail": e.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Render an error with its source chain, `outer: inner: root`.
///
/// reqwest keeps the useful part (DNS failure, connection refused) in the
/// source, not in the top-level message.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
