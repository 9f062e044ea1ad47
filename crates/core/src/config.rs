//! Configuration file management
//!
//! The config file is a single TOML document holding client defaults and the
//! alias table. It lives at `$BLS_CONFIG_DIR/config.toml`, or under the
//! platform config directory when the variable is unset.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alias::Alias;
use crate::error::{Error, Result};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "BLS_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_VERSION: &str = "1";
const DEFAULT_MAX_RETRY: u32 = 5;

/// Persisted client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version
    #[serde(default = "default_version")]
    pub version: String,

    /// Client-wide defaults
    #[serde(default)]
    pub defaults: Defaults,

    /// Named storage endpoints
    #[serde(default)]
    pub aliases: Vec<Alias>,
}

/// Client-wide defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Total listing attempts per target, including the first one
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_max_retry() -> u32 {
    DEFAULT_MAX_RETRY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            defaults: Defaults::default(),
            aliases: Vec::new(),
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            max_retry: DEFAULT_MAX_RETRY,
        }
    }
}

impl Config {
    /// Find an alias by name
    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name == name)
    }
}

/// Loads and saves the config file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Create a manager for the default config location
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .map(|d| d.join("bls"))
                .ok_or_else(|| Error::Config("Cannot determine config directory".into()))?,
        };
        Ok(Self::with_path(dir.join(CONFIG_FILE_NAME)))
    }

    /// Create a manager for an explicit config file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the config file
    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// Load the config, returning defaults if the file does not exist
    pub fn load(&self) -> Result<Config> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Config file missing, using defaults");
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "Unable to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Unable to parse {}: {e}", self.path.display())))
    }

    /// Write the config, creating the parent directory if needed
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Unable to serialize config: {e}")))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.defaults.max_retry, 5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.toml"));

        let mut config = Config::default();
        config.defaults.max_retry = 2;
        config
            .aliases
            .push(Alias::new("play", "https://play.min.io", "key", "secret"));
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.alias("play").is_some());
        assert!(loaded.alias("other").is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[[aliases]]\nname = \"local\"\nendpoint = \"http://localhost:9000\"\n",
        )
        .unwrap();

        let config = ConfigManager::with_path(&path).load().unwrap();
        assert_eq!(config.version, "1");
        assert_eq!(config.defaults.max_retry, 5);
        assert_eq!(config.aliases[0].region, "us-east-1");
        assert!(config.aliases[0].access_key.is_empty());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "aliases = 3 = 4").unwrap();

        let err = ConfigManager::with_path(&path).load().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
