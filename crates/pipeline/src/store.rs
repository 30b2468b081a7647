//! Persistence seams used by the workflows.
//!
//! The workflows only need a handful of single-row operations, so they go
//! through these traits rather than the repositories directly. [`PgJobStore`]
//! forwards to the `twyn-db` repositories.

use async_trait::async_trait;
use sqlx::PgPool;
use twyn_core::limits::SubscriptionTier;
use twyn_core::types::DbId;
use twyn_db::models::generation_job::{CreateGenerationJob, GenerationJob};
use twyn_db::models::status::GenerationStatus;
use twyn_db::models::training_job::{CreateTrainingJob, TrainingJob};
use twyn_db::models::user::UsageAction;
use twyn_db::repositories::{GenerationJobRepo, TrainingJobRepo, UserRepo};

#[async_trait]
pub trait TrainingJobStore: Send + Sync {
    async fn create(&self, input: &CreateTrainingJob) -> Result<TrainingJob, sqlx::Error>;
    async fn set_remote_task_id(&self, id: DbId, task_id: &str) -> Result<(), sqlx::Error>;
    async fn mark_training(&self, id: DbId) -> Result<bool, sqlx::Error>;
    async fn complete(
        &self,
        id: DbId,
        external_id: &str,
        thumbnail_url: Option<&str>,
    ) -> Result<bool, sqlx::Error>;
    async fn fail(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error>;
    async fn fail_by_external_id(&self, external_id: &str, error: &str) -> Result<u64, sqlx::Error>;
    async fn list_in_flight(&self) -> Result<Vec<TrainingJob>, sqlx::Error>;
}

#[async_trait]
pub trait GenerationJobStore: Send + Sync {
    async fn create(&self, input: &CreateGenerationJob) -> Result<GenerationJob, sqlx::Error>;
    async fn set_remote_task_id(&self, id: &str, task_id: &str) -> Result<(), sqlx::Error>;
    async fn complete(
        &self,
        id: &str,
        result_image_keys: &[String],
        batch_id: Option<&str>,
    ) -> Result<bool, sqlx::Error>;
    async fn fail(&self, id: &str, status: GenerationStatus, error: &str) -> Result<bool, sqlx::Error>;
    async fn list_processing(&self) -> Result<Vec<GenerationJob>, sqlx::Error>;
}

/// Usage counters for one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub tier: SubscriptionTier,
    pub model_count: i32,
    pub monthly_generations: i32,
}

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn snapshot(&self, owner_id: DbId) -> Result<UsageSnapshot, sqlx::Error>;
    async fn record_training(&self, owner_id: DbId, metadata: serde_json::Value) -> Result<(), sqlx::Error>;
    async fn record_generation(
        &self,
        owner_id: DbId,
        image_count: i32,
        metadata: serde_json::Value,
    ) -> Result<(), sqlx::Error>;
}

/// All three stores over one Postgres pool.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrainingJobStore for PgJobStore {
    async fn create(&self, input: &CreateTrainingJob) -> Result<TrainingJob, sqlx::Error> {
        UserRepo::ensure(&self.pool, input.owner_id).await?;
        TrainingJobRepo::create(&self.pool, input).await
    }

    async fn set_remote_task_id(&self, id: DbId, task_id: &str) -> Result<(), sqlx::Error> {
        TrainingJobRepo::set_remote_task_id(&self.pool, id, task_id).await
    }

    async fn mark_training(&self, id: DbId) -> Result<bool, sqlx::Error> {
        TrainingJobRepo::mark_training(&self.pool, id).await
    }

    async fn complete(
        &self,
        id: DbId,
        external_id: &str,
        thumbnail_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        TrainingJobRepo::complete(&self.pool, id, external_id, thumbnail_url).await
    }

    async fn fail(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        TrainingJobRepo::fail(&self.pool, id, error).await
    }

    async fn fail_by_external_id(&self, external_id: &str, error: &str) -> Result<u64, sqlx::Error> {
        TrainingJobRepo::fail_by_external_id(&self.pool, external_id, error).await
    }

    async fn list_in_flight(&self) -> Result<Vec<TrainingJob>, sqlx::Error> {
        TrainingJobRepo::list_in_flight(&self.pool).await
    }
}

#[async_trait]
impl GenerationJobStore for PgJobStore {
    async fn create(&self, input: &CreateGenerationJob) -> Result<GenerationJob, sqlx::Error> {
        UserRepo::ensure(&self.pool, input.owner_id).await?;
        GenerationJobRepo::create(&self.pool, input).await
    }

    async fn set_remote_task_id(&self, id: &str, task_id: &str) -> Result<(), sqlx::Error> {
        GenerationJobRepo::set_remote_task_id(&self.pool, id, task_id).await
    }

    async fn complete(
        &self,
        id: &str,
        result_image_keys: &[String],
        batch_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        GenerationJobRepo::complete(&self.pool, id, result_image_keys, batch_id).await
    }

    async fn fail(&self, id: &str, status: GenerationStatus, error: &str) -> Result<bool, sqlx::Error> {
        GenerationJobRepo::fail(&self.pool, id, status, error).await
    }

    async fn list_processing(&self) -> Result<Vec<GenerationJob>, sqlx::Error> {
        GenerationJobRepo::list_processing(&self.pool).await
    }
}

#[async_trait]
impl UsageStore for PgJobStore {
    async fn snapshot(&self, owner_id: DbId) -> Result<UsageSnapshot, sqlx::Error> {
        let user = UserRepo::ensure(&self.pool, owner_id).await?;
        Ok(UsageSnapshot {
            tier: user.tier(),
            model_count: user.model_count,
            monthly_generations: user.monthly_generations,
        })
    }

    async fn record_training(&self, owner_id: DbId, metadata: serde_json::Value) -> Result<(), sqlx::Error> {
        UserRepo::increment_model_count(&self.pool, owner_id).await?;
        UserRepo::log_usage(&self.pool, owner_id, UsageAction::Train, 1, Some(&metadata)).await
    }

    async fn record_generation(
        &self,
        owner_id: DbId,
        image_count: i32,
        metadata: serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        UserRepo::increment_generations(&self.pool, owner_id, image_count).await?;
        UserRepo::log_usage(
            &self.pool,
            owner_id,
            UsageAction::Generate,
            image_count,
            Some(&metadata),
        )
        .await
    }
}
