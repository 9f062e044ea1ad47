//! Routes resolved targets to a storage backend

use async_trait::async_trait;
use bls_core::{
    ClientFactory, Error, FsClient, HostConfig, Location, Result, StorageClient,
};
use bls_s3::S3Client;

/// Builds an `FsClient` for local paths and an `S3Client` for endpoint URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendFactory;

#[async_trait]
impl ClientFactory for BackendFactory {
    async fn connect(
        &self,
        canonical_url: &str,
        host: &HostConfig,
    ) -> Result<Box<dyn StorageClient>> {
        match Location::parse(canonical_url) {
            Some(Location::Local(_)) => Ok(Box::new(FsClient::new(canonical_url)?)),
            Some(Location::Remote(_)) => Ok(Box::new(S3Client::new(canonical_url, host).await?)),
            None => Err(Error::Connection(format!(
                "No backend can serve {canonical_url}"
            ))),
        }
    }
}
