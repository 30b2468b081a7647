//! Repository for the `training_jobs` table.

use sqlx::PgPool;
use twyn_core::types::DbId;

use crate::models::status::{status_strings, TrainingStatus};
use crate::models::training_job::{CreateTrainingJob, TrainingJob};

/// Column list for `training_jobs` queries.
const COLUMNS: &str = "\
    id, owner_id, display_name, status, input_photo_count, \
    external_character_id, thumbnail_url, provisional_folder_key, \
    remote_task_id, error_detail, created_at, updated_at";

fn allowed_from(next: TrainingStatus) -> Vec<String> {
    status_strings(&TrainingStatus::predecessors_of(next), TrainingStatus::as_str)
}

/// Provides CRUD and guarded status transitions for training jobs.
pub struct TrainingJobRepo;

impl TrainingJobRepo {
    /// Insert a new job in `pending`.
    pub async fn create(pool: &PgPool, input: &CreateTrainingJob) -> Result<TrainingJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_jobs \
                (id, owner_id, display_name, status, input_photo_count, provisional_folder_key) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(input.id)
            .bind(input.owner_id)
            .bind(&input.display_name)
            .bind(TrainingStatus::Pending.as_str())
            .bind(input.input_photo_count)
            .bind(&input.provisional_folder_key)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TrainingJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM training_jobs WHERE id = $1");
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a job only if it belongs to `owner_id`.
    pub async fn find_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
    ) -> Result<Option<TrainingJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM training_jobs WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// All jobs for an owner, newest first.
    pub async fn list_by_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<TrainingJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM training_jobs WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Jobs in `pending` or `training`, oldest first. Used by restart recovery.
    pub async fn list_in_flight(pool: &PgPool) -> Result<Vec<TrainingJob>, sqlx::Error> {
        let in_flight: Vec<String> = TrainingStatus::ALL
            .iter()
            .filter(|s| s.is_in_flight())
            .map(|s| s.as_str().to_string())
            .collect();
        let query = format!(
            "SELECT {COLUMNS} FROM training_jobs WHERE status = ANY($1) ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(in_flight)
            .fetch_all(pool)
            .await
    }

    /// Record the provider task id returned by submission.
    pub async fn set_remote_task_id(pool: &PgPool, id: DbId, task_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE training_jobs SET remote_task_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Move `pending -> training`. Returns `false` if the job was not pending.
    pub async fn mark_training(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE training_jobs SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = ANY($3)",
        )
        .bind(id)
        .bind(TrainingStatus::Training.as_str())
        .bind(allowed_from(TrainingStatus::Training))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move `pending | training -> completed`, writing the external id and
    /// thumbnail together. Returns `false` if the job was already terminal.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        external_character_id: &str,
        thumbnail_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE training_jobs \
             SET status = $2, external_character_id = $3, thumbnail_url = $4, updated_at = NOW() \
             WHERE id = $1 AND status = ANY($5) AND external_character_id IS NULL",
        )
        .bind(id)
        .bind(TrainingStatus::Completed.as_str())
        .bind(external_character_id)
        .bind(thumbnail_url)
        .bind(allowed_from(TrainingStatus::Completed))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move any non-failed job to `failed`. Returns `false` if it was
    /// already failed or does not exist.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE training_jobs SET status = $2, error_detail = $3, updated_at = NOW() \
             WHERE id = $1 AND status = ANY($4)",
        )
        .bind(id)
        .bind(TrainingStatus::Failed.as_str())
        .bind(error)
        .bind(allowed_from(TrainingStatus::Failed))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fail every job whose trained character is `external_character_id`.
    /// Returns the number of jobs changed.
    pub async fn fail_by_external_id(
        pool: &PgPool,
        external_character_id: &str,
        error: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE training_jobs SET status = $2, error_detail = $3, updated_at = NOW() \
             WHERE external_character_id = $1 AND status = ANY($4)",
        )
        .bind(external_character_id)
        .bind(TrainingStatus::Failed.as_str())
        .bind(error)
        .bind(allowed_from(TrainingStatus::Failed))
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
