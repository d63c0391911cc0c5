//! S3 bucket client
//!
//! Built from explicit credentials with a custom endpoint and path-style
//! addressing so S3-compatible services (MinIO, Backblaze, Supabase Storage)
//! work out of the box.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::StorageConfig;

use super::{ObjectStore, StorageError};

/// S3-backed implementation of [`ObjectStore`]
#[derive(Clone)]
pub struct BucketClient {
    client: Client,
    bucket: String,
}

impl BucketClient {
    /// Create a client for the configured bucket.
    ///
    /// Credential correctness is not verified here; the first remote call
    /// surfaces any authentication failure as a transport error.
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "librarium-config",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(true);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Content type for an object key, by extension
fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl ObjectStore for BucketClient {
    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::Transport(e.to_string()))?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    names.push(key.to_string());
                }
            }
        }

        Ok(names)
    }

    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::NotFound(name.to_string())
                } else {
                    StorageError::Transport(service_err.to_string())
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type(content_type_for(name))
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for("fiction.csv"), "text/csv");
        assert_eq!(content_type_for("shelf.txt"), "text/plain");
        assert_eq!(content_type_for("shelf.JPG"), "image/jpeg");
        assert_eq!(content_type_for("shelf.png"), "image/png");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }
}
