//! Resolver tuning.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use rise_client::MAX_PAGE_SIZE;

/// Configuration for [`LocationResolver`](crate::LocationResolver).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    /// Items requested per collection page (capped at the upstream max of 100).
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum in-flight upstream fetches per fan-out group.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Lifetime of cached pages and items, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Timeout for one page or item fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_concurrency() -> usize {
    16
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            concurrency: default_concurrency(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RISE_PAGE_SIZE") {
            if let Ok(size) = val.parse() {
                config.page_size = size;
            }
        }

        if let Ok(val) = std::env::var("RISE_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                config.concurrency = n;
            }
        }

        if let Ok(val) = std::env::var("RISE_CACHE_TTL_SECS") {
            if let Ok(secs) = val.parse() {
                config.cache_ttl_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("RISE_FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.fetch_timeout_secs = secs;
            }
        }

        config
    }

    /// Page size clamped to what the upstream accepts.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Concurrency cap, at least one.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
