//! A fully resolved listing target

use crate::config::Config;
use crate::error::Result;
use crate::host::{HostConfig, lookup};
use crate::resolve::resolve;

/// One user-supplied location, resolved and matched to its host settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Argument exactly as given
    pub raw_argument: String,
    /// Alias-expanded URL with the recursion marker stripped
    pub canonical_url: String,
    pub recursive: bool,
    pub host_config: HostConfig,
}

impl Target {
    /// Resolve `raw` against the alias table and find its host config.
    ///
    /// Alias-addressed arguments use the named alias; direct URLs and local
    /// paths go through [`lookup`].
    pub fn resolve(raw: &str, config: &Config) -> Result<Self> {
        let resolved = resolve(raw, &config.aliases)?;
        let host_config = match resolved.alias {
            Some(alias) => HostConfig::from(alias),
            None => lookup(&resolved.canonical_url, config)?,
        };
        Ok(Self {
            raw_argument: raw.to_string(),
            canonical_url: resolved.canonical_url,
            recursive: resolved.recursive,
            host_config,
        })
    }
}
