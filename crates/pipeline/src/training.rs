//! Training workflow driver.
//!
//! Synchronous phase: check limits, create the `pending` record, provision
//! input blobs under a provisional folder, submit to the provider and store
//! the task id. Detached phase: `training`, poll, then either `completed` +
//! reorganize or `failed`, and a notification either way.
//!
//! Fresh uploads and a previously uploaded onboarding folder only differ in
//! how the input URLs are obtained; both go through [`Pipeline::submit_training`].

use serde_json::json;
use twyn_core::ids::temp_folder_name;
use twyn_core::keys::{model_folder, training_prefix, validate_temp_folder_name};
use twyn_core::limits::ensure_can_create_model;
use twyn_core::types::DbId;
use twyn_core::validation::{validate_image_count, MAX_TRAINING_IMAGES};
use twyn_db::models::training_job::{CreateTrainingJob, TrainingJob};
use twyn_events::PushMessage;
use twyn_provider::TrainingRequest;

use crate::poll::run_training_poll;
use crate::reorganize::reorganize;
use crate::{Pipeline, WorkflowError};

/// Longest accepted model display name.
const MAX_NAME_LEN: usize = 100;

/// One uploaded photo with its sniffed content type.
#[derive(Debug, Clone)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

fn validate_name(name: &str) -> Result<String, WorkflowError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkflowError::Validation("Model name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(WorkflowError::Validation(format!(
            "Model name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

impl Pipeline {
    /// Train from freshly uploaded photos.
    pub async fn start_training_from_uploads(
        &self,
        owner_id: DbId,
        name: &str,
        photos: Vec<Photo>,
    ) -> Result<TrainingJob, WorkflowError> {
        let name = validate_name(name)?;
        validate_image_count(photos.len(), 1, MAX_TRAINING_IMAGES)?;
        self.check_model_limit(owner_id).await?;

        let folder = model_folder(owner_id, &temp_folder_name(chrono::Utc::now()));
        let job = self
            .training_jobs
            .create(&CreateTrainingJob {
                id: uuid::Uuid::new_v4(),
                owner_id,
                display_name: name,
                input_photo_count: photos.len() as i32,
                provisional_folder_key: folder.clone(),
            })
            .await?;

        let prefix = training_prefix(&folder);
        let mut urls = Vec::with_capacity(photos.len());
        for photo in photos {
            match self.blobs.put(photo.bytes, &prefix, &photo.content_type).await {
                Ok(stored) => urls.push(stored.url),
                Err(e) => {
                    self.fail_training_record(job.id, &format!("Upload failed: {e}")).await;
                    return Err(e.into());
                }
            }
        }
        tracing::info!(job_id = %job.id, owner_id = %owner_id, count = urls.len(), "Uploaded training photos");

        self.submit_training(job, urls).await
    }

    /// Train from photos already uploaded to `users/{owner}/{temp_folder}/training/`.
    pub async fn start_training_from_folder(
        &self,
        owner_id: DbId,
        name: &str,
        temp_folder: &str,
    ) -> Result<TrainingJob, WorkflowError> {
        let name = validate_name(name)?;
        validate_temp_folder_name(temp_folder)?;
        self.check_model_limit(owner_id).await?;

        let folder = model_folder(owner_id, temp_folder);
        let keys = self.blobs.list(&format!("{}/", training_prefix(&folder))).await?;
        if keys.is_empty() {
            return Err(WorkflowError::Validation(format!(
                "No uploaded images found in '{temp_folder}'"
            )));
        }
        validate_image_count(keys.len(), 1, MAX_TRAINING_IMAGES)?;
        let urls: Vec<String> = keys.iter().map(|k| self.blobs.public_url(k)).collect();

        let job = self
            .training_jobs
            .create(&CreateTrainingJob {
                id: uuid::Uuid::new_v4(),
                owner_id,
                display_name: name,
                input_photo_count: keys.len() as i32,
                provisional_folder_key: folder,
            })
            .await?;

        self.submit_training(job, urls).await
    }

    async fn check_model_limit(&self, owner_id: DbId) -> Result<(), WorkflowError> {
        let usage = self.usage.snapshot(owner_id).await?;
        ensure_can_create_model(usage.model_count, usage.tier)?;
        Ok(())
    }

    /// Submit a `pending` record's inputs and detach the poll.
    async fn submit_training(
        &self,
        mut job: TrainingJob,
        input_urls: Vec<String>,
    ) -> Result<TrainingJob, WorkflowError> {
        let request = TrainingRequest {
            name: job.display_name.clone(),
            input_images: input_urls,
        };
        let task_id = match self.provider.submit_training(&request).await {
            Ok(task_id) => task_id,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Training submission failed");
                self.fail_training_record(job.id, &format!("Submission failed: {e}")).await;
                return Err(WorkflowError::RemoteSubmission(e));
            }
        };

        self.training_jobs.set_remote_task_id(job.id, &task_id).await?;
        job.remote_task_id = Some(task_id.clone());

        if let Err(e) = self
            .usage
            .record_training(
                job.owner_id,
                json!({ "model_id": job.id, "photo_count": job.input_photo_count }),
            )
            .await
        {
            tracing::warn!(job_id = %job.id, error = %e, "Failed to record training usage");
        }

        tracing::info!(job_id = %job.id, task_id = %task_id, "Training submitted, polling in background");
        self.spawn_training_poll(job.clone(), task_id);
        Ok(job)
    }

    pub(crate) fn spawn_training_poll(&self, job: TrainingJob, task_id: String) {
        let pipeline = self.clone();
        self.runner.spawn("training_poll", async move {
            pipeline.run_training(job, task_id).await;
        });
    }

    /// Detached phase. Never returns an error; every outcome lands in the
    /// job record and a notification.
    async fn run_training(&self, job: TrainingJob, task_id: String) {
        match self.training_jobs.mark_training(job.id).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(job_id = %job.id, "Job was not pending, continuing poll"),
            Err(e) => tracing::error!(job_id = %job.id, error = %e, "Failed to mark job training"),
        }

        let result = run_training_poll(self.provider.as_ref(), &task_id, &self.training_poll).await;

        let message = match result {
            Ok(outcome) => {
                let completed = self
                    .training_jobs
                    .complete(job.id, &outcome.external_id, outcome.thumbnail_url.as_deref())
                    .await;
                match completed {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::warn!(job_id = %job.id, "Job already terminal, dropping training result");
                        return;
                    }
                    Err(e) => {
                        tracing::error!(job_id = %job.id, error = %e, "Failed to record training completion");
                        self.fail_training_record(
                            job.id,
                            &format!("Failed to record training result: {e}"),
                        )
                        .await;
                        self.notifier
                            .notify(job.owner_id, &PushMessage::training_failed(job.id, &job.display_name))
                            .await;
                        return;
                    }
                }
                tracing::info!(
                    job_id = %job.id,
                    external_id = %outcome.external_id,
                    "Training completed"
                );

                let final_folder = model_folder(job.owner_id, &outcome.external_id);
                let report = reorganize(
                    self.blobs.as_ref(),
                    job.owner_id,
                    &job.provisional_folder_key,
                    &final_folder,
                )
                .await;
                if !report.is_complete() {
                    tracing::warn!(
                        job_id = %job.id,
                        listed = report.listed,
                        moved = report.moved,
                        failures = report.failures.len(),
                        "Training blobs only partially reorganized"
                    );
                }

                PushMessage::training_completed(job.id, &job.display_name)
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, task_id = %task_id, error = %e, "Training failed");
                self.fail_training_record(job.id, &e.to_string()).await;
                PushMessage::training_failed(job.id, &job.display_name)
            }
        };

        self.notifier.notify(job.owner_id, &message).await;
    }

    pub(crate) async fn fail_training_record(&self, id: DbId, error: &str) {
        if let Err(e) = self.training_jobs.fail(id, error).await {
            tracing::error!(job_id = %id, error = %e, "Failed to mark training job failed");
        }
    }
}
