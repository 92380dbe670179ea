//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::time::Duration;

use agora_shared::constants::{DEFAULT_API_BASE_URL, DEFAULT_HTTP_PORT, MEDIA_FETCH_TIMEOUT_SECS};

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" | "test" => Some(Self::Development),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// Base URL of the backend REST API.
    /// Env: `API_BASE_URL`
    /// Default: `http://localhost:8000/api`
    pub api_base_url: String,

    /// Base URL media is served from when not under the API.
    /// Env: `MEDIA_BASE_URL`
    /// Default: the API base without its trailing `/api`.
    pub media_base_url: String,

    /// Env: `APP_ENV` (`production` / `development`)
    /// Default: development
    pub environment: Environment,

    /// Per-attempt upstream timeout, applied in production only.
    /// Env: `MEDIA_TIMEOUT_SECS`
    /// Default: `30`
    pub media_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            media_base_url: media_base_from_api(DEFAULT_API_BASE_URL),
            environment: Environment::Development,
            media_timeout: Duration::from_secs(MEDIA_FETCH_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(url) = std::env::var("API_BASE_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.api_base_url = url.to_string();
                config.media_base_url = media_base_from_api(url);
            }
        }

        // Read after API_BASE_URL so an explicit value wins over the derived one.
        if let Ok(url) = std::env::var("MEDIA_BASE_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.media_base_url = url.to_string();
            }
        }

        if let Ok(val) = std::env::var("APP_ENV") {
            match Environment::parse(&val) {
                Some(env) => config.environment = env,
                None => tracing::warn!(value = %val, "Invalid APP_ENV, using development"),
            }
        }

        if let Ok(val) = std::env::var("MEDIA_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.media_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid MEDIA_TIMEOUT_SECS, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// The timeout given to each candidate fetch, if any.
    pub fn media_fetch_timeout(&self) -> Option<Duration> {
        match self.environment {
            Environment::Production => Some(self.media_timeout),
            Environment::Development => None,
        }
    }
}

/// `http://host/api` -> `http://host`.
fn media_base_from_api(api_base: &str) -> String {
    let trimmed = api_base.trim_end_matches('/');
    trimmed
        .strip_suffix("/api")
        .unwrap_or(trimmed)
        .to_string()
}
