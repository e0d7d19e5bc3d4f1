use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Settings for the demo binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Base latency for simulated remote validators, in milliseconds
    pub stub_latency_ms: u64,

    /// Extra random jitter added on top of the base latency
    #[serde(default)]
    pub stub_jitter_ms: u64,

    /// Mirror logs to a daily-rotated file under the config directory
    #[serde(default)]
    pub log_to_file: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            stub_latency_ms: 500,
            stub_jitter_ms: 200,
            log_to_file: false,
        }
    }
}

impl DemoConfig {
    /// Load configuration from the platform config directory.
    /// Creates a default config file if none exists.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
                path: path.display().to_string(),
                source: Box::new(source),
            })?;
            let config =
                serde_json::from_str(&content).map_err(|source| ConfigError::LoadFailed {
                    path: path.display().to_string(),
                    source: Box::new(source),
                })?;
            tracing::info!("Loaded config from: {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default config at: {}", path.display());
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(source),
        })?;
        fs::write(path, json).map_err(|source| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(source),
        })?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("form-flow").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DemoConfig::default();
        assert_eq!(config.stub_latency_ms, 500);
        assert_eq!(config.stub_jitter_ms, 200);
        assert!(!config.log_to_file);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = DemoConfig {
            stub_latency_ms: 50,
            stub_jitter_ms: 0,
            log_to_file: true,
        };
        config.save_to(&path).unwrap();

        let loaded = DemoConfig::load_from(&path).unwrap();
        assert_eq!(loaded.stub_latency_ms, 50);
        assert_eq!(loaded.stub_jitter_ms, 0);
        assert!(loaded.log_to_file);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = DemoConfig::load_from(&path).unwrap();
        assert_eq!(config.stub_latency_ms, 500);
        assert!(path.exists());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = DemoConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { .. }));
    }
}
