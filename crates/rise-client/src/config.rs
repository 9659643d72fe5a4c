//! HTTP client configuration for the RISE upstream.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`RiseClient`](crate::RiseClient).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiseClientConfig {
    /// Base URL of the upstream, without the `/rise/api` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Idle connections kept per host.
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

fn default_base_url() -> String {
    "https://data.usbr.gov".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

impl Default for RiseClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}

impl RiseClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RISE_BASE_URL") {
            config.base_url = val;
        }

        if let Ok(val) = std::env::var("RISE_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("RISE_CONNECT_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.connect_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("RISE_POOL_MAX_IDLE") {
            if let Ok(n) = val.parse() {
                config.pool_max_idle_per_host = n;
            }
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// URL of a collection endpoint.
    pub fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/rise/api/{}",
            self.base_url.trim_end_matches('/'),
            collection
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RiseClientConfig::default();
        assert_eq!(config.base_url, "https://data.usbr.gov");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: RiseClientConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:9999/"}"#).unwrap();

        assert_eq!(config.base_url, "http://localhost:9999/");
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(
            config.collection_url("location"),
            "http://localhost:9999/rise/api/location"
        );
    }
}
