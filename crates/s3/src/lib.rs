//! bls-s3: S3 backend for the bls storage listing client
//!
//! This crate implements the StorageClient trait from bls-core
//! using the aws-sdk-s3 crate.

mod client;

pub use client::S3Client;
