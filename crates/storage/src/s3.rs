//! AWS S3 implementation of [`BlobStore`].

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::{new_object_key, BlobStore, StorageError, StoredBlob};

/// S3 connection settings.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Base for public object URLs, without trailing slash.
    pub public_base_url: String,
}

impl S3Config {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default                                   |
    /// |----------------------|-------------------------------------------|
    /// | `S3_BUCKET`          | required                                  |
    /// | `AWS_REGION`         | required                                  |
    /// | `S3_PUBLIC_BASE_URL` | `https://{bucket}.s3.{region}.amazonaws.com` |
    pub fn from_env() -> Result<Self, StorageError> {
        let bucket = required_var("S3_BUCKET")?;
        let region = required_var("AWS_REGION")?;
        let public_base_url = std::env::var("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{bucket}.s3.{region}.amazonaws.com"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bucket,
            region,
            public_base_url,
        })
    }
}

fn required_var(name: &str) -> Result<String, StorageError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StorageError::Config(format!("{name} must be set")))
}

/// [`BlobStore`] backed by a single S3 bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    config: S3Config,
}

impl S3BlobStore {
    /// Build a client from the ambient AWS credential chain.
    pub async fn connect(config: S3Config) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Self {
            client: Client::new(&sdk_config),
            config,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn backend_error<E: std::error::Error>(
        operation: &'static str,
        key: &str,
        err: E,
    ) -> StorageError {
        StorageError::Backend {
            operation,
            key: key.to_string(),
            message: DisplayErrorContext(err).to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        bytes: Vec<u8>,
        key_prefix: &str,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        let key = new_object_key(key_prefix, content_type);
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| Self::backend_error("put", &key, e))?;

        tracing::debug!(key = %key, "Uploaded object");
        Ok(StoredBlob {
            url: self.public_url(&key),
            key,
        })
    }

    async fn list(&self, key_prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(key_prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| Self::backend_error("list", key_prefix, e))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }
        keys.sort();
        Ok(keys)
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<(), StorageError> {
        self.client
            .copy_object()
            .bucket(&self.config.bucket)
            .copy_source(format!("{}/{src_key}", self.config.bucket))
            .key(dst_key)
            .send()
            .await
            .map_err(|e| Self::backend_error("copy", src_key, e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::backend_error("delete", key, e))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.config.public_base_url)
    }
}
