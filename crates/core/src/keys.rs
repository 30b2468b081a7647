//! Blob-store key layout.
//!
//! Every object lives under `users/{owner}/`. Training inputs are uploaded to
//! a provisional folder (`users/{owner}/temp_.../training/`) and moved to
//! `users/{owner}/{external_id}/` once the provider has named the trained
//! character. Generated images live under
//! `users/{owner}/{character_or_style}/generations/`.

use crate::error::CoreError;
use crate::ids::TEMP_FOLDER_PREFIX;
use crate::types::DbId;

/// Sub-folder holding training inputs inside a model folder.
pub const TRAINING_DIR: &str = "training";

/// Sub-folder holding generated images inside a model folder.
pub const GENERATIONS_DIR: &str = "generations";

/// Root folder for one owner, with trailing slash.
pub fn user_root(owner_id: DbId) -> String {
    format!("users/{owner_id}/")
}

/// Folder for a named resource (temp folder or external id), with trailing slash.
pub fn model_folder(owner_id: DbId, name: &str) -> String {
    format!("users/{owner_id}/{name}/")
}

/// Key prefix (no trailing slash) that training inputs are uploaded under.
pub fn training_prefix(folder: &str) -> String {
    format!("{folder}{TRAINING_DIR}")
}

/// Key prefix (no trailing slash) that generated images are uploaded under.
pub fn generations_prefix(owner_id: DbId, namespace: &str) -> String {
    format!("users/{owner_id}/{namespace}/{GENERATIONS_DIR}")
}

/// Rewrite `key` from the `from` folder into the `to` folder, keeping the
/// remainder of the path. Returns `None` when `key` is not under `from`.
pub fn relocate(key: &str, from: &str, to: &str) -> Option<String> {
    key.strip_prefix(from).map(|rest| format!("{to}{rest}"))
}

/// Validate a client-supplied provisional folder name.
///
/// Only names produced by [`crate::ids::temp_folder_name`] are accepted, so a
/// caller can never point a training job at somebody else's prefix.
pub fn validate_temp_folder_name(name: &str) -> Result<(), CoreError> {
    let well_formed = name.starts_with(TEMP_FOLDER_PREFIX)
        && name.len() > TEMP_FOLDER_PREFIX.len()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid temp folder name '{name}'"
        )))
    }
}
