//! Training job entity and create DTO.

use serde::Serialize;
use sqlx::FromRow;
use twyn_core::types::{DbId, Timestamp};

use super::status::TrainingStatus;

/// A row from the `training_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrainingJob {
    pub id: DbId,
    pub owner_id: DbId,
    pub display_name: String,
    pub status: String,
    pub input_photo_count: i32,
    pub external_character_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub provisional_folder_key: String,
    #[serde(skip_serializing)]
    pub remote_task_id: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TrainingJob {
    /// Parsed status. `None` only if the column holds a value the
    /// migration's CHECK constraint would have rejected.
    pub fn status(&self) -> Option<TrainingStatus> {
        TrainingStatus::parse(&self.status)
    }
}

/// DTO for inserting a new pending training job.
#[derive(Debug, Clone)]
pub struct CreateTrainingJob {
    pub id: DbId,
    pub owner_id: DbId,
    pub display_name: String,
    pub input_photo_count: i32,
    pub provisional_folder_key: String,
}
