//! HTTP API route definitions.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ConfigError;

use super::handlers::{catalog_details, health, item_details, prometheus, AppState};

/// Create the API router.
///
/// The body limit and CORS policy come from config; `/metrics` is mounted
/// only when the state carries a Prometheus handle.
pub fn create_router(state: AppState, config: &Config) -> Result<Router, ConfigError> {
    let mut router = Router::new()
        // Health endpoint
        .route("/health", get(health))
        // Relays
        .route("/roblox/catalog/items/details", post(catalog_details))
        .route("/rolimons/itemdetails", get(item_details));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(prometheus));
    }

    Ok(router
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Any origin unless an allow-list is configured.
fn cors_layer(config: &Config) -> Result<CorsLayer, ConfigError> {
    Ok(match config.allowed_origins()? {
        None => CorsLayer::permissive(),
        Some(origins) => CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    })
}
