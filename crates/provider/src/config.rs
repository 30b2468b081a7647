use std::time::Duration;

use crate::ProviderError;

/// Default provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.302.ai";

/// Provider connection settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Per-request timeout. Polling cadence is owned by the pipeline.
    pub request_timeout: Duration,
}

impl ProviderConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                         | Default              |
    /// |---------------------------------|----------------------|
    /// | `AI_302_API_KEY`                | required             |
    /// | `AI_302_BASE_URL`               | `https://api.302.ai` |
    /// | `PROVIDER_REQUEST_TIMEOUT_SECS` | `30`                 |
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("AI_302_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ProviderError::Config("AI_302_API_KEY must be set".into()))?;

        let base_url = std::env::var("AI_302_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = std::env::var("PROVIDER_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .map_err(|_| {
                ProviderError::Config("PROVIDER_REQUEST_TIMEOUT_SECS must be a valid u64".into())
            })?;

        Ok(Self {
            api_key,
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
