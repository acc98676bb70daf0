//! Remote backend configuration.
//!
//! Safe-to-ship public endpoint/key values required to reach the hosted
//! backend. Secret credentials are never stored here.

use std::time::Duration;

use pdn_core::{Error, Result};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const BASE_URL_VAR: &str = "PDN_BASE_URL";
const API_KEY_VAR: &str = "PDN_API_KEY";

/// Endpoint configuration for the hosted backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://project.example.co`
    pub base_url: String,
    /// Public API key sent with every request
    pub api_key: String,
    /// Delay between live-query polls
    pub poll_interval: Duration,
}

impl RemoteConfig {
    /// Validate and normalize the endpoint values
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.as_ref())?;
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(Error::Validation(
                "Remote API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            api_key,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Read `PDN_BASE_URL`/`PDN_API_KEY` from the environment (honoring a
    /// `.env` file). Returns `Ok(None)` when neither is set.
    pub fn from_env() -> Result<Option<Self>> {
        dotenvy::dotenv().ok();
        resolve_optional_remote_config(
            std::env::var(BASE_URL_VAR).ok(),
            std::env::var(API_KEY_VAR).ok(),
        )
    }

    /// Override the live-query poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Auth endpoint root
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.base_url)
    }

    /// Collection endpoint root
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base_url)
    }
}

/// Resolve an optional config from optional values.
///
/// Public for testability: both absent is "not configured" (`Ok(None)`),
/// exactly one absent is a configuration error.
pub fn resolve_optional_remote_config(
    base_url: Option<String>,
    api_key: Option<String>,
) -> Result<Option<RemoteConfig>> {
    let base_url = normalize_text_option(base_url);
    let api_key = normalize_text_option(api_key);

    match (base_url, api_key) {
        (None, None) => Ok(None),
        (Some(base_url), Some(api_key)) => RemoteConfig::new(base_url, api_key).map(Some),
        _ => Err(Error::Validation(format!(
            "{BASE_URL_VAR} and {API_KEY_VAR} must be set together"
        ))),
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::Validation(
            "Remote base URL must not be empty".to_string(),
        ));
    }
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(Error::Validation(
            "Remote base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn normalize_text_option(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
