//! Provider configuration
//!
//! Values come from the manifest's `provider` block. Any field left out
//! falls back to the `YB_*` environment variables.

use std::collections::HashMap;
use std::time::Duration;

use yba_core::resource::Value;
use yba_core::task::DEFAULT_POLL_INTERVAL;
use yba_core::timeouts::parse_duration;

use crate::error::{ApiError, Result};

pub const ENV_HOST: &str = "YB_HOST";
pub const ENV_API_KEY: &str = "YB_API_KEY";
pub const ENV_ENABLE_HTTPS: &str = "YB_ENABLE_HTTPS";

/// Connection settings for one YBA instance
#[derive(Clone)]
pub struct ProviderConfig {
    /// Host and optional port, e.g. `yba.example.com:443`
    pub host: String,
    pub api_token: String,
    pub enable_https: bool,
    /// Interval between task status probes
    pub poll_interval: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("api_token", &"(sensitive)")
            .field("enable_https", &self.enable_https)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl ProviderConfig {
    /// Create ProviderConfig from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::from_attributes(&HashMap::new())
    }

    /// Decode the `provider` block, falling back to the environment
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> Result<Self> {
        let host = string_attr(attrs, "host")?
            .or_else(|| std::env::var(ENV_HOST).ok())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                ApiError::InvalidConfig(format!("host is required (or set {})", ENV_HOST))
            })?;

        let api_token = string_attr(attrs, "api_token")?
            .or_else(|| std::env::var(ENV_API_KEY).ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::InvalidConfig(format!("api_token is required (or set {})", ENV_API_KEY))
            })?;

        let enable_https = match attrs.get("enable_https") {
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ApiError::InvalidConfig(
                    "enable_https must be a boolean".to_string(),
                ));
            }
            None => match std::env::var(ENV_ENABLE_HTTPS) {
                Ok(v) => parse_bool(&v).ok_or_else(|| {
                    ApiError::InvalidConfig(format!(
                        "{} must be 'true' or 'false', got '{}'",
                        ENV_ENABLE_HTTPS, v
                    ))
                })?,
                Err(_) => true,
            },
        };

        let poll_interval = match string_attr(attrs, "poll_interval")? {
            Some(s) => parse_duration(&s)
                .map_err(|e| ApiError::InvalidConfig(format!("poll_interval: {}", e)))?,
            None => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            host,
            api_token,
            enable_https,
            poll_interval,
        })
    }

    /// Base URL of the YBA instance, without a trailing slash
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            return host.to_string();
        }
        let scheme = if self.enable_https { "https" } else { "http" };
        format!("{}://{}", scheme, host)
    }
}

fn string_attr(attrs: &HashMap<String, Value>, key: &str) -> Result<Option<String>> {
    match attrs.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ApiError::InvalidConfig(format!("{} must be a string", key))),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
