//! Host configuration lookup

use url::Url;

use crate::alias::Alias;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::resolve::Location;

/// Alias name reported for local filesystem targets
pub const LOCAL_ALIAS: &str = "local";

/// Static credentials for a remote endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Connection settings for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Alias the settings came from
    pub alias_name: String,
    /// Endpoint URL, empty for local targets
    pub endpoint: String,
    /// `None` for local targets or anonymous access
    pub credentials: Option<Credentials>,
    pub region: String,
}

impl HostConfig {
    /// Settings used for local filesystem targets
    pub fn local() -> Self {
        Self {
            alias_name: LOCAL_ALIAS.to_string(),
            endpoint: String::new(),
            credentials: None,
            region: String::new(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.endpoint.is_empty()
    }
}

impl From<&Alias> for HostConfig {
    fn from(alias: &Alias) -> Self {
        let credentials = if alias.access_key.is_empty() && alias.secret_key.is_empty() {
            None
        } else {
            Some(Credentials {
                access_key: alias.access_key.clone(),
                secret_key: alias.secret_key.clone(),
            })
        };
        Self {
            alias_name: alias.name.clone(),
            endpoint: alias.endpoint.clone(),
            credentials,
            region: alias.region.clone(),
        }
    }
}

/// Find the connection settings for a canonical URL.
///
/// Used for direct URLs and local paths. Remote URLs match the first alias
/// whose endpoint has the same scheme, host and port. Local paths always
/// succeed.
pub fn lookup(canonical_url: &str, config: &Config) -> Result<HostConfig> {
    match Location::parse(canonical_url) {
        Some(Location::Local(_)) => Ok(HostConfig::local()),
        Some(Location::Remote(url)) => config
            .aliases
            .iter()
            .find(|alias| same_origin(&alias.endpoint, &url))
            .map(HostConfig::from)
            .ok_or_else(|| Error::ConfigLookup(canonical_url.to_string())),
        None => Err(Error::ConfigLookup(canonical_url.to_string())),
    }
}

fn same_origin(endpoint: &str, target: &Url) -> bool {
    let Ok(endpoint) = Url::parse(endpoint) else {
        return false;
    };
    endpoint.scheme() == target.scheme()
        && endpoint.host_str() == target.host_str()
        && endpoint.port_or_known_default() == target.port_or_known_default()
}
