//! Client configuration loaded from environment variables.
//!
//! Every setting has a default suitable for local development.

use std::time::Duration;

use agora_shared::constants::DEFAULT_API_BASE_URL;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the forum REST API, without a trailing slash.
    /// Env: `FORUM_API_URL`
    /// Default: `http://localhost:8000/api`
    pub api_base_url: String,

    /// Bearer token issued by the identity provider.
    /// Env: `FORUM_API_TOKEN`
    /// Default: none (anonymous requests).
    pub api_token: Option<String>,

    /// Timeout applied to every backend request.
    /// Env: `FORUM_REQUEST_TIMEOUT_SECS`
    /// Default: `30`
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("FORUM_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                tracing::warn!("Empty FORUM_API_URL, using default");
            } else {
                config.api_base_url = url.to_string();
            }
        }

        if let Some(token) = lookup("FORUM_API_TOKEN") {
            if !token.is_empty() {
                config.api_token = Some(token);
            }
        }

        if let Some(val) = lookup("FORUM_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid FORUM_REQUEST_TIMEOUT_SECS, using default"),
            }
        }

        config
    }
}
