//! Generation job entity and create DTO.

use serde::Serialize;
use sqlx::FromRow;
use twyn_core::types::{DbId, Timestamp};

use super::status::GenerationStatus;

/// A row from the `generation_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationJob {
    pub id: String,
    pub owner_id: DbId,
    pub prompt: String,
    pub style_id: String,
    pub character_id: Option<String>,
    pub quality: String,
    pub aspect_ratio: String,
    pub status: String,
    pub result_image_keys: Vec<String>,
    pub error_detail: Option<String>,
    #[serde(skip_serializing)]
    pub remote_task_id: Option<String>,
    pub batch_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl GenerationJob {
    pub fn status(&self) -> Option<GenerationStatus> {
        GenerationStatus::parse(&self.status)
    }
}

/// DTO for inserting a new `processing` generation job.
#[derive(Debug, Clone)]
pub struct CreateGenerationJob {
    pub id: String,
    pub owner_id: DbId,
    pub prompt: String,
    pub style_id: String,
    pub character_id: Option<String>,
    pub quality: String,
    pub aspect_ratio: String,
}
