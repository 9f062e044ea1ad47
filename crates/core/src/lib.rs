//! bls-core: Core library for the bls storage listing client
//!
//! This crate provides the core functionality for the bls CLI, including:
//! - Configuration and alias management
//! - Location resolution and host config lookup
//! - StorageClient trait and the local filesystem backend
//! - Listing driver and retry controller
//!
//! This crate is designed to be independent of any specific storage SDK,
//! allowing for easy testing and additional backends.

pub mod alias;
pub mod config;
pub mod error;
pub mod fs;
pub mod host;
pub mod listing;
pub mod resolve;
pub mod retry;
pub mod target;
pub mod traits;

pub use alias::{Alias, AliasManager};
pub use config::{Config, ConfigManager};
pub use error::{Error, ErrorKind, Result};
pub use fs::FsClient;
pub use host::{Credentials, HostConfig, lookup};
pub use listing::{drive, stop_after_error};
pub use resolve::{Location, RECURSIVE_MARKER, Resolved, resolve};
pub use retry::{RetryConfig, Sleeper, TokioSleeper, is_retryable_error, run_with_retry};
pub use target::Target;
pub use traits::{ClientFactory, Entry, EntryKind, EntryStream, ListResult, StorageClient};
