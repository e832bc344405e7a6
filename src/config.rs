//! Runtime configuration from environment variables (`.env` is loaded first by
//! [`crate::run`]).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TEMPLATE_API_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_SPEC_STORE_DIR: &str = "./data";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} is not a usable http(s) URL: '{value}'")]
    InvalidUrl { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub template_api_url: Url,
    pub bind_address: String,
    pub spec_store_dir: PathBuf,
    /// Sessions untouched for this long are discarded.
    pub session_idle: Duration,
    pub http_timeout: Duration,
    pub default_locale: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str, default: &str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let raw_url = get("TEMPLATE_API_URL", DEFAULT_TEMPLATE_API_URL);
        let template_api_url = Url::parse(&raw_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or(ConfigError::InvalidUrl {
                var: "TEMPLATE_API_URL",
                value: raw_url.clone(),
            })?;

        Ok(Self {
            template_api_url,
            bind_address: get("BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
            spec_store_dir: PathBuf::from(get("SPEC_STORE_DIR", DEFAULT_SPEC_STORE_DIR)),
            session_idle: seconds("SESSION_IDLE_SECS", lookup("SESSION_IDLE_SECS"), DEFAULT_SESSION_IDLE_SECS)?,
            http_timeout: seconds("HTTP_TIMEOUT_SECS", lookup("HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT_SECS)?,
            default_locale: get("DEFAULT_LOCALE", DEFAULT_LOCALE),
        })
    }
}

fn seconds(var: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidNumber {
                var,
                value: raw.to_string(),
            }),
    }
}
