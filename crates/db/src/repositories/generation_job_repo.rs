//! Repository for the `generation_jobs` table.

use sqlx::PgPool;
use twyn_core::types::DbId;

use crate::models::generation_job::{CreateGenerationJob, GenerationJob};
use crate::models::status::GenerationStatus;

/// Column list for `generation_jobs` queries.
const COLUMNS: &str = "\
    id, owner_id, prompt, style_id, character_id, quality, aspect_ratio, \
    status, result_image_keys, error_detail, remote_task_id, batch_id, \
    created_at, updated_at, completed_at";

/// Provides CRUD and guarded terminal transitions for generation jobs.
pub struct GenerationJobRepo;

impl GenerationJobRepo {
    /// Insert a new job in `processing`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateGenerationJob,
    ) -> Result<GenerationJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO generation_jobs \
                (id, owner_id, prompt, style_id, character_id, quality, aspect_ratio, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationJob>(&query)
            .bind(&input.id)
            .bind(input.owner_id)
            .bind(&input.prompt)
            .bind(&input.style_id)
            .bind(&input.character_id)
            .bind(&input.quality)
            .bind(&input.aspect_ratio)
            .bind(GenerationStatus::Processing.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<GenerationJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_jobs WHERE id = $1");
        sqlx::query_as::<_, GenerationJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a job only if it belongs to `owner_id`.
    pub async fn find_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        id: &str,
    ) -> Result<Option<GenerationJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_jobs WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, GenerationJob>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Jobs still `processing`, oldest first. Used by restart recovery.
    pub async fn list_processing(pool: &PgPool) -> Result<Vec<GenerationJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_jobs WHERE status = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, GenerationJob>(&query)
            .bind(GenerationStatus::Processing.as_str())
            .fetch_all(pool)
            .await
    }

    pub async fn set_remote_task_id(pool: &PgPool, id: &str, task_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generation_jobs SET remote_task_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Move `processing -> completed` with the final blob keys.
    ///
    /// `result_image_keys` must be non-empty; the table's CHECK constraint
    /// rejects a completed row without keys.
    pub async fn complete(
        pool: &PgPool,
        id: &str,
        result_image_keys: &[String],
        batch_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_jobs \
             SET status = $2, result_image_keys = $3, batch_id = $4, \
                 completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = $5",
        )
        .bind(id)
        .bind(GenerationStatus::Completed.as_str())
        .bind(result_image_keys)
        .bind(batch_id)
        .bind(GenerationStatus::Processing.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move `processing` into `failed` or `content_rejected`.
    pub async fn fail(
        pool: &PgPool,
        id: &str,
        status: GenerationStatus,
        error_detail: &str,
    ) -> Result<bool, sqlx::Error> {
        debug_assert!(
            matches!(status, GenerationStatus::Failed | GenerationStatus::ContentRejected),
            "fail() only writes failure statuses"
        );
        let result = sqlx::query(
            "UPDATE generation_jobs \
             SET status = $2, error_detail = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(error_detail)
        .bind(GenerationStatus::Processing.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
