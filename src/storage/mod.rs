//! Storage module for S3-compatible backends
//!
//! Supports MinIO, Cloudflare R2, Backblaze B2, Supabase Storage, and AWS S3.
//! The core only needs three capabilities from the remote store: list object
//! names, download bytes by name, and create-or-overwrite bytes by name.

mod client;

pub use client::BucketClient;

use async_trait::async_trait;
use thiserror::Error;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// The named object does not exist in the bucket
    #[error("object not found: {0}")]
    NotFound(String),

    /// The store was unreachable or returned a transport-level failure
    #[error("storage transport error: {0}")]
    Transport(String),
}

/// Minimal remote object store capability.
///
/// Overwrite-on-upload is the only mutation; there is no delete or rename.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all object names in the bucket
    async fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Download an object's bytes by name
    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or overwrite an object
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;
}
