//! Alias and URL resolution
//!
//! Turns a user-supplied location into a canonical URL. Accepted forms:
//! - `http(s)://host[:port]/bucket/prefix`
//! - `file:///abs/path`, `/abs/path`, `./rel`, `../rel`, `~/path`
//! - `alias/bucket/prefix`, expanded through the alias table
//!
//! A trailing `...` requests a recursive listing and never appears in the
//! canonical URL.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::alias::Alias;
use crate::error::{Error, Result};

/// Suffix marking a location for recursive listing
pub const RECURSIVE_MARKER: &str = "...";

/// A location that passed resolution and can be handed to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Absolute local filesystem path
    Local(PathBuf),
    /// `http`/`https` endpoint URL with a host
    Remote(Url),
}

impl Location {
    /// Parse a canonical URL. Returns `None` for unexpanded alias forms.
    pub fn parse(canonical: &str) -> Option<Location> {
        let path = Path::new(canonical);
        if path.is_absolute() {
            return Some(Location::Local(path.to_path_buf()));
        }
        let url = Url::parse(canonical).ok()?;
        match url.scheme() {
            "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => {
                Some(Location::Remote(url))
            }
            _ => None,
        }
    }
}

/// Outcome of resolving one raw argument
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub canonical_url: String,
    pub recursive: bool,
    /// Alias named by the argument, when it was alias-addressed
    pub alias: Option<&'a Alias>,
}

/// Resolve a raw argument into its canonical URL and recursion flag
pub fn resolve<'a>(raw: &str, aliases: &'a [Alias]) -> Result<Resolved<'a>> {
    let (body, recursive) = match raw.strip_suffix(RECURSIVE_MARKER) {
        Some(body) => (body, true),
        None => (raw, false),
    };

    if body.is_empty() {
        return Err(Error::InvalidUrl(format!("empty location '{raw}'")));
    }

    let mut named = None;
    let canonical = if let Some((scheme, rest)) = body.split_once("://") {
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => validate_remote(body)?,
            "file" => {
                if rest.is_empty() {
                    return Err(Error::InvalidUrl(format!("empty path in '{raw}'")));
                }
                absolutize(rest)?
            }
            _ => return Err(Error::UnsupportedScheme(scheme.to_string())),
        }
    } else if is_local_path(body) {
        absolutize(body)?
    } else {
        let (name, rest) = body.split_once('/').unwrap_or((body, ""));
        match aliases.iter().find(|a| a.name == name) {
            Some(alias) => {
                named = Some(alias);
                validate_remote(&join_endpoint(&alias.endpoint, rest))?
            }
            None => body.to_string(),
        }
    };

    tracing::debug!(
        raw,
        canonical = %canonical,
        recursive,
        alias = named.map(|a| a.name.as_str()),
        "Resolved location"
    );
    Ok(Resolved {
        canonical_url: canonical,
        recursive,
        alias: named,
    })
}

fn validate_remote(candidate: &str) -> Result<String> {
    let url = Url::parse(candidate).map_err(|e| Error::InvalidUrl(format!("{candidate}: {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidUrl(format!("{candidate}: missing host")));
    }
    Ok(candidate.to_string())
}

fn join_endpoint(endpoint: &str, rest: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        endpoint.to_string()
    } else {
        format!("{endpoint}/{rest}")
    }
}

fn is_local_path(arg: &str) -> bool {
    arg == "."
        || arg == ".."
        || arg == "~"
        || arg.starts_with('/')
        || arg.starts_with("./")
        || arg.starts_with("../")
        || arg.starts_with("~/")
        || Path::new(arg).is_absolute()
}

/// Make a local path absolute and lexically normalized, without touching it
fn absolutize(arg: &str) -> Result<String> {
    let path = if arg == "~" || arg.starts_with("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::InvalidUrl(format!("cannot expand '~' in '{arg}'")))?;
        home.join(arg.trim_start_matches('~').trim_start_matches('/'))
    } else {
        PathBuf::from(arg)
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|e| Error::InvalidUrl(format!("{arg}: {e}")))?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    Ok(normalized.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases() -> Vec<Alias> {
        vec![
            Alias::new("play", "https://play.min.io", "k", "s"),
            Alias::new("store", "http://localhost:9000/", "k", "s"),
        ]
    }

    fn url(raw: &str, aliases: &[Alias]) -> String {
        resolve(raw, aliases).unwrap().canonical_url
    }

    #[test]
    fn test_alias_expansion() {
        let aliases = aliases();
        let resolved = resolve("play/bucket/prefix", &aliases).unwrap();
        assert_eq!(resolved.canonical_url, "https://play.min.io/bucket/prefix");
        assert!(!resolved.recursive);
        assert_eq!(resolved.alias.map(|a| a.name.as_str()), Some("play"));

        assert_eq!(url("store/bucket", &aliases), "http://localhost:9000/bucket");
        assert_eq!(url("store", &aliases), "http://localhost:9000");
    }

    #[test]
    fn test_recursive_marker_stripped() {
        let aliases = aliases();
        let resolved = resolve("play/bucket...", &aliases).unwrap();
        assert_eq!(resolved.canonical_url, "https://play.min.io/bucket");
        assert!(resolved.recursive);

        let resolved = resolve("play/bucket/...", &aliases).unwrap();
        assert_eq!(resolved.canonical_url, "https://play.min.io/bucket/");
        assert!(resolved.recursive);
        assert!(!resolved.canonical_url.contains(RECURSIVE_MARKER));
    }

    #[test]
    fn test_direct_urls() {
        let aliases = aliases();
        let resolved = resolve("https://s3.example.com/bucket", &aliases).unwrap();
        assert_eq!(resolved.canonical_url, "https://s3.example.com/bucket");
        assert!(resolved.alias.is_none());
    }

    #[test]
    fn test_unsupported_scheme() {
        assert!(matches!(
            resolve("ftp://host/bucket", &[]),
            Err(Error::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn test_malformed_urls() {
        assert!(matches!(resolve("http://", &[]), Err(Error::InvalidUrl(_))));
        assert!(matches!(resolve("...", &[]), Err(Error::InvalidUrl(_))));
        assert!(matches!(resolve("", &[]), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_unknown_alias_left_unexpanded() {
        let aliases = aliases();
        let resolved = resolve("nosuchhost/bucket", &aliases).unwrap();
        assert_eq!(resolved.canonical_url, "nosuchhost/bucket");
        assert!(!resolved.recursive);
        assert!(resolved.alias.is_none());
        assert_eq!(Location::parse(&resolved.canonical_url), None);
    }

    #[test]
    fn test_local_paths_normalized() {
        let resolved = resolve("/tmp/a/./b/../c...", &[]).unwrap();
        assert_eq!(resolved.canonical_url, "/tmp/a/c");
        assert!(resolved.recursive);
        assert_eq!(
            Location::parse(&resolved.canonical_url),
            Some(Location::Local(PathBuf::from("/tmp/a/c")))
        );

        assert_eq!(url("file:///var/data", &[]), "/var/data");
        assert!(Path::new(&url(".", &[])).is_absolute());
    }

    #[test]
    fn test_location_parse_remote() {
        match Location::parse("http://localhost:9000/bucket") {
            Some(Location::Remote(url)) => assert_eq!(url.port(), Some(9000)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
