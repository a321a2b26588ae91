//! Engine configuration.

use std::path::{Path, PathBuf};
use entity_progress_core::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Progress engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Prefix of persistent cache ids
    pub cache_namespace: String,

    /// Tags attached to every persisted result
    pub base_cache_tags: Vec<String>,

    /// Read and write the persistent cache
    pub persistent_cache: bool,

    /// Maximum reference hops below the evaluated entity; unbounded when unset
    pub max_reference_depth: Option<usize>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            cache_namespace: DEFAULT_NAMESPACE.to_string(),
            base_cache_tags: vec![DEFAULT_NAMESPACE.to_string()],
            persistent_cache: true,
            max_reference_depth: None,
        }
    }
}

impl ProgressConfig {
    /// Parse configuration from JSON; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert_eq!(config.cache_namespace, "entity.progress");
        assert_eq!(config.base_cache_tags, vec!["entity.progress".to_string()]);
        assert!(config.persistent_cache);
        assert!(config.max_reference_depth.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ProgressConfig::from_json_str(r#"{"max_reference_depth": 4}"#).unwrap();
        assert_eq!(config.max_reference_depth, Some(4));
        assert_eq!(config.cache_namespace, "entity.progress");
    }

    #[test]
    fn test_invalid_json() {
        let err = ProgressConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ProgressConfig::from_file("/nonexistent/progress.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/progress.json"));
    }
}
