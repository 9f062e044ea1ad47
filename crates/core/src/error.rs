//! Error types for bls-core
//!
//! Every failure a listing can hit maps onto one of five kinds: URL parse,
//! config lookup, connection, transient list, or terminal list errors.

use std::fmt;

use thiserror::Error;

/// Result type alias for bls-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while resolving, connecting to, or listing a target
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed location syntax
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Location uses a scheme no backend understands
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// No alias or host entry matches the target
    #[error("No host configuration for {0}")]
    ConfigLookup(String),

    /// Named alias does not exist in the config file
    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    /// Config file could not be read, parsed, or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client construction failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Network failure while listing
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials rejected or access denied
    #[error("Access denied: {0}")]
    Auth(String),

    /// Bucket, prefix, or path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with something it should not have
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A listing error annotated with the target it happened on
    #[error("{source}")]
    Listing {
        target: String,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification used for diagnostics and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UrlParse,
    ConfigLookup,
    Connection,
    TransientList,
    TerminalList,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UrlParse => "URL parse error",
            ErrorKind::ConfigLookup => "config lookup error",
            ErrorKind::Connection => "connection error",
            ErrorKind::TransientList => "transient list error",
            ErrorKind::TerminalList => "terminal list error",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Annotate a listing error with the target URL it occurred on
    pub fn listing(target: impl Into<String>, source: Error) -> Self {
        Error::Listing {
            target: target.into(),
            source: Box::new(source),
        }
    }

    /// The error with any target annotation peeled off
    pub fn root(&self) -> &Error {
        match self {
            Error::Listing { source, .. } => source.root(),
            other => other,
        }
    }

    /// Target URL recorded by the listing driver, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Error::Listing { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Error::InvalidUrl(_) | Error::UnsupportedScheme(_) => ErrorKind::UrlParse,
            Error::ConfigLookup(_) | Error::AliasNotFound(_) | Error::Config(_) => {
                ErrorKind::ConfigLookup
            }
            Error::Connection(_) => ErrorKind::Connection,
            _ if crate::retry::is_retryable_error(self) => ErrorKind::TransientList,
            _ => ErrorKind::TerminalList,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_annotation_is_transparent() {
        let err = Error::listing("https://host/bucket", Error::NotFound("bucket".into()));
        assert_eq!(err.target(), Some("https://host/bucket"));
        assert!(matches!(err.root(), Error::NotFound(_)));
        assert_eq!(err.to_string(), "Not found: bucket");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::UnsupportedScheme("ftp".into()).kind(),
            ErrorKind::UrlParse
        );
        assert_eq!(
            Error::ConfigLookup("nosuchhost/bucket".into()).kind(),
            ErrorKind::ConfigLookup
        );
        assert_eq!(
            Error::Connection("refused".into()).kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            Error::listing("t", Error::Network("connection reset by peer".into())).kind(),
            ErrorKind::TransientList
        );
        assert_eq!(
            Error::listing("t", Error::Auth("denied".into())).kind(),
            ErrorKind::TerminalList
        );
    }
}
