//! Moves a training job's blobs from the provisional folder to the folder
//! named after the trained character.
//!
//! The store has no rename, so each object is copied then deleted. A failed
//! object is recorded and skipped; the rest still move.

use twyn_core::keys::{relocate, user_root};
use twyn_core::types::DbId;
use twyn_storage::BlobStore;

/// Outcome of [`reorganize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorganizeReport {
    /// Objects found under the provisional folder.
    pub listed: usize,
    /// Objects now living under the final folder.
    pub moved: usize,
    /// `(source key, error)` for every object that did not move cleanly.
    pub failures: Vec<(String, String)>,
}

impl ReorganizeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.moved == self.listed
    }
}

/// Relocate everything under `provisional_folder` to `final_folder`,
/// keeping the path below the folder. Both folders end with `/` and must lie
/// under `users/{owner_id}/`.
pub async fn reorganize(
    store: &dyn BlobStore,
    owner_id: DbId,
    provisional_folder: &str,
    final_folder: &str,
) -> ReorganizeReport {
    let mut report = ReorganizeReport::default();

    let root = user_root(owner_id);
    if !provisional_folder.starts_with(&root) || !final_folder.starts_with(&root) {
        tracing::error!(
            owner_id = %owner_id,
            provisional_folder,
            final_folder,
            "Refusing to reorganize outside the owner's folder"
        );
        report
            .failures
            .push((provisional_folder.to_string(), "folder outside owner root".to_string()));
        return report;
    }
    if provisional_folder == final_folder {
        return report;
    }

    let keys = match store.list(provisional_folder).await {
        Ok(keys) => keys,
        Err(e) => {
            tracing::warn!(owner_id = %owner_id, provisional_folder, error = %e, "Failed to list provisional folder");
            report.failures.push((provisional_folder.to_string(), e.to_string()));
            return report;
        }
    };
    report.listed = keys.len();

    for key in keys {
        let Some(new_key) = relocate(&key, provisional_folder, final_folder) else {
            continue;
        };
        if let Err(e) = store.copy(&key, &new_key).await {
            tracing::warn!(key = %key, new_key = %new_key, error = %e, "Failed to copy object");
            report.failures.push((key, e.to_string()));
            continue;
        }
        report.moved += 1;
        if let Err(e) = store.delete(&key).await {
            // The copy exists, so the object is usable; only the old key lingers.
            tracing::warn!(key = %key, error = %e, "Failed to delete moved object");
            report.failures.push((key, e.to_string()));
        }
    }

    if report.is_complete() {
        tracing::info!(owner_id = %owner_id, moved = report.moved, final_folder, "Reorganized training files");
    } else {
        tracing::warn!(
            owner_id = %owner_id,
            listed = report.listed,
            moved = report.moved,
            failed = report.failures.len(),
            final_folder,
            "Reorganization finished with failures"
        );
    }
    report
}
