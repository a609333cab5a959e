//! CORS relay for the Roblox catalog and Rolimons item APIs.
//!
//! Browsers cannot call either API directly, so this service sits in
//! between and exposes two stateless endpoints:
//!
//! ```text
//! POST /roblox/catalog/items/details  -> catalog.roblox.com, relayed byte-for-byte
//! GET  /rolimons/itemdetails?ids=1,2  -> rolimons.com, projected to
//!                                        { "<id>": { name, rap, value, price } }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Error types and their JSON responses
//! - [`upstream`]: HTTP client for both upstream APIs
//! - [`summary`]: Id parsing and item record projection
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod summary;
pub mod upstream;
pub mod utils;

pub use config::Config;
pub use error::RelayError;
