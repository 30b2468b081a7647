//! Blob Store Adapter.
//!
//! [`BlobStore`] is the narrow key/value surface the pipeline needs: put,
//! list by prefix, copy and delete. There is no rename; moves are built from
//! copy + delete by the caller. [`S3BlobStore`] talks to AWS S3,
//! [`MemoryBlobStore`] backs tests and local development.

pub mod error;
pub mod memory;
pub mod s3;

use async_trait::async_trait;

pub use error::StorageError;
pub use memory::MemoryBlobStore;
pub use s3::{S3BlobStore, S3Config};

/// Result of a successful [`BlobStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a fresh key inside `key_prefix`.
    async fn put(
        &self,
        bytes: Vec<u8>,
        key_prefix: &str,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError>;

    /// All keys starting with `key_prefix`, in lexical order.
    async fn list(&self, key_prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL of `key`. Pure; the object need not exist.
    fn public_url(&self, key: &str) -> String;
}

/// Build a fresh object key: `{prefix}/{uuid}{ext}`.
pub fn new_object_key(key_prefix: &str, content_type: &str) -> String {
    let prefix = key_prefix.trim_end_matches('/');
    format!(
        "{prefix}/{}{}",
        uuid::Uuid::new_v4(),
        extension_for(content_type)
    )
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_keeps_prefix_and_extension() {
        let key = new_object_key("users/u/temp_1/training", "image/png");
        assert!(key.starts_with("users/u/temp_1/training/"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn object_key_tolerates_trailing_slash() {
        let key = new_object_key("users/u/x/generations/", "application/octet-stream");
        assert!(!key.contains("//"));
        assert!(!key.contains('.'));
    }
}
