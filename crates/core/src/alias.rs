//! Alias management
//!
//! An alias is a short name for a storage endpoint plus the credentials used
//! to reach it. `play/bucket` expands to `<endpoint of play>/bucket`.

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};

const DEFAULT_REGION: &str = "us-east-1";

/// A named storage endpoint
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    /// Alias name, the first path segment of an aliased location
    pub name: String,

    /// Endpoint URL (e.g. `https://play.min.io`)
    pub endpoint: String,

    /// Access key ID
    #[serde(default)]
    pub access_key: String,

    /// Secret access key
    #[serde(default)]
    pub secret_key: String,

    /// Region sent with signed requests
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Alias {
    pub fn new(name: &str, endpoint: &str, access_key: &str, secret_key: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: default_region(),
        }
    }
}

impl std::fmt::Debug for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alias")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Reads and edits the alias table stored in the config file
#[derive(Debug, Clone)]
pub struct AliasManager {
    config: ConfigManager,
}

impl AliasManager {
    /// Create a manager for the default config location
    pub fn new() -> Result<Self> {
        Ok(Self::with_config_manager(ConfigManager::new()?))
    }

    pub fn with_config_manager(config: ConfigManager) -> Self {
        Self { config }
    }

    /// Look up an alias by name
    pub fn get(&self, name: &str) -> Result<Alias> {
        self.config
            .load()?
            .alias(name)
            .cloned()
            .ok_or_else(|| Error::AliasNotFound(name.to_string()))
    }

    /// All aliases, sorted by name
    pub fn list(&self) -> Result<Vec<Alias>> {
        let mut aliases = self.config.load()?.aliases;
        aliases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(aliases)
    }

    /// Add an alias, replacing any existing alias with the same name
    pub fn set(&self, alias: Alias) -> Result<()> {
        let mut config = self.config.load()?;
        match config.aliases.iter_mut().find(|a| a.name == alias.name) {
            Some(existing) => *existing = alias,
            None => config.aliases.push(alias),
        }
        self.config.save(&config)
    }

    /// Remove an alias by name
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config.load()?;
        let before = config.aliases.len();
        config.aliases.retain(|a| a.name != name);
        if config.aliases.len() == before {
            return Err(Error::AliasNotFound(name.to_string()));
        }
        self.config.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> AliasManager {
        AliasManager::with_config_manager(ConfigManager::with_path(
            dir.path().join("config.toml"),
        ))
    }

    #[test]
    fn test_set_get_replace() {
        let dir = TempDir::new().unwrap();
        let am = manager(&dir);

        am.set(Alias::new("local", "http://localhost:9000", "a", "b"))
            .unwrap();
        assert_eq!(am.get("local").unwrap().endpoint, "http://localhost:9000");

        am.set(Alias::new("local", "http://localhost:9100", "a", "b"))
            .unwrap();
        assert_eq!(am.get("local").unwrap().endpoint, "http://localhost:9100");
        assert_eq!(am.list().unwrap().len(), 1);
    }

    #[test]
    fn test_list_sorted() {
        let dir = TempDir::new().unwrap();
        let am = manager(&dir);
        am.set(Alias::new("s3", "https://s3.amazonaws.com", "a", "b"))
            .unwrap();
        am.set(Alias::new("local", "http://localhost:9000", "a", "b"))
            .unwrap();

        let names: Vec<_> = am.list().unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["local", "s3"]);
    }

    #[test]
    fn test_remove_missing() {
        let dir = TempDir::new().unwrap();
        let am = manager(&dir);
        assert!(matches!(
            am.remove("nope"),
            Err(Error::AliasNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let alias = Alias::new("x", "http://h", "access", "topsecret");
        let debug = format!("{alias:?}");
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("access"));
    }
}
