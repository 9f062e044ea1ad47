//! Storage client abstraction
//!
//! Backends implement [`StorageClient`] and are built through a
//! [`ClientFactory`]. This keeps the listing logic independent of any
//! particular storage SDK.

use async_trait::async_trait;
use futures::stream::BoxStream;
use jiff::Timestamp;

use crate::error::Result;
use crate::host::HostConfig;

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Regular,
    Other,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Directory => "folder",
            EntryKind::Regular => "file",
            EntryKind::Other => "other",
        }
    }
}

/// One item produced by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name relative to the listed location
    pub name: String,
    /// Size in bytes
    pub size: u64,
    pub mod_time: Timestamp,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64, mod_time: Timestamp) -> Self {
        Self {
            name: name.into(),
            size,
            mod_time,
            kind: EntryKind::Regular,
        }
    }

    pub fn dir(name: impl Into<String>, mod_time: Timestamp) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mod_time,
            kind: EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Item of a listing stream: an entry or the error that ended the listing
pub type ListResult = Result<Entry>;

/// Lazy, single-pass sequence of listing results
pub type EntryStream<'a> = BoxStream<'a, ListResult>;

/// A client bound to one canonical URL.
///
/// Both listing streams are finite and single-pass; call again for a fresh
/// pass. A stream ends right after yielding its first error.
pub trait StorageClient: Send + Sync {
    /// Canonical URL this client lists
    fn url(&self) -> &str;

    /// Immediate children only
    fn list_single(&self) -> EntryStream<'_>;

    /// Every descendant, each exactly once
    fn list(&self) -> EntryStream<'_>;
}

/// Builds storage clients for resolved targets
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Connect to `canonical_url`. Failures are [`crate::Error::Connection`].
    async fn connect(
        &self,
        canonical_url: &str,
        host: &HostConfig,
    ) -> Result<Box<dyn StorageClient>>;
}
