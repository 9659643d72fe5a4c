//! Driver configuration loading.

use anyhow::{Context, Result};
use rise_client::RiseClientConfig;
use rise_edr::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the driver, from a YAML file or the environment.
///
/// ```yaml
/// client:
///   base_url: https://data.usbr.gov
///   request_timeout_secs: 30
/// resolver:
///   concurrency: 16
///   cache_ttl_secs: 300
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DriverConfig {
    /// Upstream HTTP client settings.
    #[serde(default)]
    pub client: RiseClientConfig,

    /// Fan-out and cache settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl DriverConfig {
    /// Load from `path` if given, otherwise from `RISE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::from_env()),
        }
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;

        let config: DriverConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse driver config: {:?}", path))?;

        tracing::info!(
            base_url = %config.client.base_url,
            concurrency = config.resolver.concurrency,
            "Loaded driver config from {:?}",
            path
        );
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self {
            client: RiseClientConfig::from_env(),
            resolver: ResolverConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_yaml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "client:\n  base_url: http://localhost:9000\nresolver:\n  concurrency: 8\n"
        )
        .unwrap();

        let config = DriverConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.client.base_url, "http://localhost:9000");
        assert_eq!(config.client.request_timeout_secs, 30);
        assert_eq!(config.resolver.concurrency, 8);
        assert_eq!(config.resolver.page_size, 100);
    }

    #[test]
    fn test_empty_sections_default() {
        let config: DriverConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = DriverConfig::load(Some(Path::new("/nonexistent/rise.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "resolver: [not, a, map]").unwrap();

        assert!(DriverConfig::load(Some(file.path())).is_err());
    }
}
