//! Gateway runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the gateway. Nothing in
//! this crate reads environment variables; binaries read them and hand the raw values to the
//! helpers below.

use crate::{GatewayError, GatewayResult};
use reqwest::Url;
use std::time::Duration;

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gateway configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    base_url: Url,
    timeout: Duration,
}

impl GatewayConfig {
    /// Create a new `GatewayConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if the URL is not an absolute `http`/`https` URL
    /// with a host, or if the timeout is zero.
    pub fn new(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::InvalidConfig("base URL cannot be empty".into()));
        }

        let base_url = Url::parse(trimmed)
            .map_err(|e| GatewayError::InvalidConfig(format!("invalid base URL: {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidConfig(format!(
                "base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }
        if base_url.host_str().is_none() {
            return Err(GatewayError::InvalidConfig("base URL must name a host".into()));
        }
        if timeout.is_zero() {
            return Err(GatewayError::InvalidConfig("timeout must be non-zero".into()));
        }

        Ok(Self { base_url, timeout })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Build a [`GatewayConfig`] from optional raw environment values.
///
/// Missing or blank values fall back to [`DEFAULT_API_URL`] and [`DEFAULT_TIMEOUT_SECS`].
///
/// # Errors
///
/// Returns [`GatewayError::InvalidConfig`] if the timeout is not a whole number of seconds or the
/// resulting configuration is invalid.
pub fn gateway_config_from_env_values(
    url: Option<String>,
    timeout_secs: Option<String>,
) -> GatewayResult<GatewayConfig> {
    let url = url
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let timeout_secs = timeout_secs
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                GatewayError::InvalidConfig(format!("timeout must be whole seconds, got '{v}'"))
            })
        })
        .transpose()?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    GatewayConfig::new(&url, Duration::from_secs(timeout_secs))
}
