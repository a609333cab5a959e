//! Application configuration loaded from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::http::HeaderValue;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP listen address.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Comma-separated list of allowed origins. Unset or `*` allows any origin.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Mount the Prometheus `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    // === Upstreams ===
    /// Roblox catalog item details endpoint (POST).
    #[serde(default = "default_catalog_details_url")]
    pub catalog_details_url: String,

    /// Rolimons bulk item details endpoint (GET).
    #[serde(default = "default_item_details_url")]
    pub item_details_url: String,

    /// Total upstream request timeout. Unset means no timeout.
    #[serde(default)]
    pub upstream_timeout_ms: Option<u64>,

    /// Upstream connect timeout. Unset leaves it to the OS.
    #[serde(default)]
    pub upstream_connect_timeout_ms: Option<u64>,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_port() -> u16 {
    8787
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_body_limit() -> usize {
    512 * 1024
}

fn default_true() -> bool {
    true
}

fn default_catalog_details_url() -> String {
    "https://catalog.roblox.com/v1/items/details".to_string()
}

fn default_item_details_url() -> String {
    "https://www.rolimons.com/itemapi/itemdetails".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            body_limit_bytes: default_body_limit(),
            cors_allowed_origins: None,
            metrics_enabled: default_true(),
            catalog_details_url: default_catalog_details_url(),
            item_details_url: default_item_details_url(),
            upstream_timeout_ms: None,
            upstream_connect_timeout_ms: None,
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_upstream_url("CATALOG_DETAILS_URL", &self.catalog_details_url)?;
        check_upstream_url("ITEM_DETAILS_URL", &self.item_details_url)?;

        if self.body_limit_bytes == 0 {
            return Err(ConfigError::Invalid(
                "BODY_LIMIT_BYTES must be greater than 0".to_string(),
            ));
        }

        if matches!(self.upstream_timeout_ms, Some(0))
            || matches!(self.upstream_connect_timeout_ms, Some(0))
        {
            return Err(ConfigError::Invalid(
                "upstream timeouts must be greater than 0 when set".to_string(),
            ));
        }

        self.allowed_origins()?;
        Ok(())
    }

    /// Socket address the listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Explicit origin allow-list, or `None` when any origin is allowed.
    pub fn allowed_origins(&self) -> Result<Option<Vec<HeaderValue>>, ConfigError> {
        let Some(raw) = self.cors_allowed_origins.as_deref() else {
            return Ok(None);
        };

        let origins: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if origins.is_empty() || origins.contains(&"*") {
            return Ok(None);
        }

        origins
            .into_iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| {
                    ConfigError::Invalid(format!("invalid CORS origin: {origin}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Total upstream timeout, if configured.
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_ms.map(Duration::from_millis)
    }

    /// Upstream connect timeout, if configured.
    pub fn upstream_connect_timeout(&self) -> Option<Duration> {
        self.upstream_connect_timeout_ms.map(Duration::from_millis)
    }
}

fn check_upstream_url(name: &str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid(format!("{name}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "{name} must use http or https, got {other}"
        ))),
    }
}
