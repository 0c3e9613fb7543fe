//! Object store collaborator
//!
//! The worker and transfer stages talk to storage through [`ObjectStore`];
//! [`S3Store`] is the production implementation over aws-sdk-s3, pointed at
//! AWS or MinIO depending on [`StorageConfig`].

use crate::config::StorageConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use std::path::Path;
use tracing::{debug, info, instrument};

/// One object under a listed prefix. Size 0 marks a folder placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub key: String,
    pub size: i64,
}

impl RemoteEntry {
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Final path component of the key.
    pub fn base_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Narrow interface over the remote object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all entries under `prefix`, in listing order.
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteEntry>>;

    /// Download `key` to `local_path`.
    async fn get(&self, key: &str, local_path: &Path) -> Result<()>;

    /// Upload the file at `local_path` as `key`.
    async fn put(&self, local_path: &Path, key: &str) -> Result<()>;

    /// Server-side copy within the bucket.
    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()>;

    /// Delete `key`.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// S3-backed object store.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        debug!("Initializing object store for bucket {}", config.bucket);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "olist-ingest",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!("Object store client initialized for bucket {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self))]
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteEntry>> {
        debug!("Listing s3://{}/{}", self.bucket, prefix);

        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .context("Failed to list S3 objects")?;

        let entries = response
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key()
                    .map(|k| RemoteEntry::new(k, obj.size().unwrap_or(0)))
            })
            .collect();

        Ok(entries)
    }

    #[instrument(skip(self, local_path))]
    async fn get(&self, key: &str, local_path: &Path) -> Result<()> {
        debug!("Downloading s3://{}/{} to {}", self.bucket, key, local_path.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to download from S3: {}", key))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 response body")?
            .into_bytes();

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        tokio::fs::write(local_path, &data)
            .await
            .with_context(|| format!("Failed to write {}", local_path.display()))?;

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), self.bucket, key);

        Ok(())
    }

    #[instrument(skip(self, local_path))]
    async fn put(&self, local_path: &Path, key: &str) -> Result<()> {
        debug!("Uploading {} to s3://{}/{}", local_path.display(), self.bucket, key);

        let body = ByteStream::from_path(local_path)
            .await
            .with_context(|| format!("Failed to open {}", local_path.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to upload to S3: {}", key))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);

        Ok(())
    }

    #[instrument(skip(self))]
    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()> {
        let copy_source = format!("{}/{}", self.bucket, src_key);

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(&copy_source)
            .key(dst_key)
            .send()
            .await
            .with_context(|| format!("Failed to copy S3 object: {}", src_key))?;

        debug!(
            "Copied s3://{}/{} to s3://{}/{}",
            self.bucket, src_key, self.bucket, dst_key
        );

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete from S3: {}", key))?;

        debug!("Deleted s3://{}/{}", self.bucket, key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_prefix() {
        let entry = RemoteEntry::new("raw/olist_orders_dataset.csv", 120);
        assert_eq!(entry.base_name(), "olist_orders_dataset.csv");
    }

    #[test]
    fn base_name_without_prefix() {
        let entry = RemoteEntry::new("orders.csv", 12);
        assert_eq!(entry.base_name(), "orders.csv");
    }
}
