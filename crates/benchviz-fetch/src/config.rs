//! Loader configuration.

use benchviz_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Site origin the data files are served from.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path segment prepended to every logical data path.
    #[serde(default = "default_data_prefix")]
    pub data_prefix: String,
    /// Cache time-to-live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Largest response body accepted, in bytes.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: u64,
    /// Wall-clock deadline for one fetch, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_data_prefix() -> String {
    "/data".to_string()
}

fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}

fn default_max_content_length() -> u64 {
    10 * 1024 * 1024
}

fn default_request_timeout() -> u64 {
    30_000
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            data_prefix: default_data_prefix(),
            cache_ttl_secs: default_cache_ttl(),
            max_content_length: default_max_content_length(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl LoaderConfig {
    /// Configuration pointing at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self =
            serde_yaml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the loader cannot work with.
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {}", self.base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported scheme '{}' in base_url",
                base.scheme()
            )));
        }
        if self.max_content_length == 0 {
            return Err(Error::Config("max_content_length must be positive".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// URL of the document behind a logical data path.
    pub fn data_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.data_prefix.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}{}", base, prefix, path)
        } else {
            format!("{}{}/{}", base, prefix, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.max_content_length, 10_485_760);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_data_url() {
        let config = LoaderConfig::with_base_url("https://example.org/");
        assert_eq!(
            config.data_url("/benchmarks/atlas-4096.json"),
            "https://example.org/data/benchmarks/atlas-4096.json"
        );
        assert_eq!(
            config.data_url("benchmarks/a.json"),
            "https://example.org/data/benchmarks/a.json"
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.yaml");
        std::fs::write(&path, "base_url: https://docs.example.org\nrequest_timeout_ms: 500\n").unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url, "https://docs.example.org");
        assert_eq!(config.request_timeout_ms, 500);
        assert_eq!(config.data_prefix, "/data");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(LoaderConfig::with_base_url("not a url").validate().is_err());
        assert!(LoaderConfig::with_base_url("ftp://example.org").validate().is_err());

        let config = LoaderConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
