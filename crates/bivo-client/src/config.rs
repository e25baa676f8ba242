//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the viewer runs against a local backend
//! with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use bivo_shared::constants::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash.
    /// Env: `BIVO_API_URL`
    /// Default: `http://localhost:5000`
    pub api_url: String,

    /// Bearer token issued by the login flow.
    /// Env: `BIVO_AUTH_TOKEN`
    /// Default: none (anonymous requests).
    pub auth_token: Option<String>,

    /// Per-request timeout.
    /// Env: `BIVO_REQUEST_TIMEOUT_SECS`
    /// Default: 10 seconds.
    pub request_timeout: Duration,

    /// Directory holding the local settings database.
    /// Env: `BIVO_DATA_DIR`
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            data_dir: None,
        }
    }
}

// The token must never end up in logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BIVO_API_URL") {
            match normalize_base_url(&url) {
                Some(url) => config.api_url = url,
                None => {
                    tracing::warn!(value = %url, "Invalid BIVO_API_URL, using default");
                }
            }
        }

        if let Some(token) = lookup("BIVO_AUTH_TOKEN") {
            let token = token.trim();
            if !token.is_empty() {
                config.auth_token = Some(token.to_string());
            }
        }

        if let Some(val) = lookup("BIVO_REQUEST_TIMEOUT_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %val, "Invalid BIVO_REQUEST_TIMEOUT_SECS, using default");
                }
            }
        }

        if let Some(dir) = lookup("BIVO_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        config
    }
}

/// Accept only http(s) URLs and strip trailing slashes.
fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    has_host.then(|| trimmed.to_string())
}
