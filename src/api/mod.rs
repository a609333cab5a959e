//! HTTP API module for the relay endpoints, health, and metrics.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
