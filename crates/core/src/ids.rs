//! Locally generated identifiers.
//!
//! Training jobs use plain UUIDs; generation jobs and provisional upload
//! folders embed a millisecond timestamp plus a short random suffix so that
//! two requests from the same owner in the same millisecond never collide.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::types::{DbId, Timestamp};

/// Length of the random suffix on generation ids.
const GENERATION_SUFFIX_LEN: usize = 6;

/// Length of the random suffix on provisional folder names.
const TEMP_SUFFIX_LEN: usize = 8;

/// Prefix shared by every provisional folder name.
pub const TEMP_FOLDER_PREFIX: &str = "temp_";

/// Build a generation job id: `gen_{owner}_{millis}_{suffix}`.
pub fn generation_job_id(owner_id: DbId, now: Timestamp) -> String {
    format!(
        "gen_{owner_id}_{}_{}",
        now.timestamp_millis(),
        random_suffix(GENERATION_SUFFIX_LEN)
    )
}

/// Build a provisional folder name: `temp_{millis}_{suffix}`.
pub fn temp_folder_name(now: Timestamp) -> String {
    format!(
        "{TEMP_FOLDER_PREFIX}{}_{}",
        now.timestamp_millis(),
        random_suffix(TEMP_SUFFIX_LEN)
    )
}

fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
