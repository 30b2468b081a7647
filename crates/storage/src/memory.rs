//! In-process blob store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{new_object_key, BlobStore, StorageError, StoredBlob};

#[derive(Debug, Clone)]
struct Object {
    bytes: Vec<u8>,
    content_type: String,
}

/// A [`BlobStore`] held in memory.
///
/// Keys registered with [`MemoryBlobStore::fail_copies_of`] or
/// [`MemoryBlobStore::fail_deletes_of`] make `copy` or `delete` fail, which
/// lets callers exercise partial-failure paths.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: Mutex<BTreeMap<String, Object>>,
    failing_copies: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(BTreeMap::new()),
            failing_copies: Mutex::new(HashSet::new()),
            failing_deletes: Mutex::new(HashSet::new()),
        }
    }

    /// Insert an object at an exact key.
    pub fn insert(&self, key: impl Into<String>, bytes: Vec<u8>, content_type: &str) {
        self.lock_objects().insert(
            key.into(),
            Object {
                bytes,
                content_type: content_type.to_string(),
            },
        );
    }

    /// Make every future `copy` from `src_key` fail.
    pub fn fail_copies_of(&self, src_key: impl Into<String>) {
        self.failing_copies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(src_key.into());
    }

    /// Make every future `delete` of `key` fail.
    pub fn fail_deletes_of(&self, key: impl Into<String>) {
        self.failing_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock_objects().get(key).map(|o| o.bytes.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock_objects().get(key).map(|o| o.content_type.clone())
    }

    /// Every stored key, in lexical order.
    pub fn keys(&self) -> Vec<String> {
        self.lock_objects().keys().cloned().collect()
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Object>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bytes: Vec<u8>,
        key_prefix: &str,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        let key = new_object_key(key_prefix, content_type);
        self.insert(key.clone(), bytes, content_type);
        Ok(StoredBlob {
            url: self.public_url(&key),
            key,
        })
    }

    async fn list(&self, key_prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .lock_objects()
            .keys()
            .filter(|k| k.starts_with(key_prefix))
            .cloned()
            .collect())
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<(), StorageError> {
        let failing = self
            .failing_copies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(src_key);
        if failing {
            return Err(StorageError::Backend {
                operation: "copy",
                key: src_key.to_string(),
                message: "injected failure".to_string(),
            });
        }

        let mut objects = self.lock_objects();
        let object = objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(src_key.to_string()))?;
        objects.insert(dst_key.to_string(), object);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let failing = self
            .failing_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key);
        if failing {
            return Err(StorageError::Backend {
                operation: "delete",
                key: key.to_string(),
                message: "injected failure".to_string(),
            });
        }

        // S3 treats deleting a missing key as success; mirror that.
        self.lock_objects().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url.trim_end_matches('/'))
    }
}
