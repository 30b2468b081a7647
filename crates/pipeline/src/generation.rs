//! Generation workflow driver.
//!
//! Synchronous phase: validate input and limits, confirm the referenced
//! character still exists, create the `processing` record, submit and store
//! the task id. Detached phase: poll, copy result images into the blob store,
//! then `completed`, `failed` or `content_rejected`, and a notification.

use rand::Rng;
use serde_json::json;
use twyn_core::ids::generation_job_id;
use twyn_core::keys::generations_prefix;
use twyn_core::limits::ensure_can_generate;
use twyn_core::types::DbId;
use twyn_core::validation::{validate_aspect_ratio, Quality, DEFAULT_ASPECT_RATIO};
use twyn_db::models::generation_job::{CreateGenerationJob, GenerationJob};
use twyn_db::models::status::GenerationStatus;
use twyn_events::PushMessage;
use twyn_provider::GenerationRequest;

use crate::media::sniff_image;
use crate::poll::{run_generation_poll, GenerationOutcome, PollError};
use crate::{Pipeline, WorkflowError};

/// Upper bound (exclusive) of the random seed chosen when none is given.
const MAX_RANDOM_SEED: u32 = 1_000_000;

/// Longest accepted prompt.
const MAX_PROMPT_LEN: usize = 2000;

/// Caller-supplied generation parameters. `None` fields take defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub prompt: String,
    pub style_id: String,
    pub character_id: Option<String>,
    pub quality: Option<Quality>,
    pub aspect_ratio: Option<String>,
    pub enhance_prompt: Option<bool>,
    pub negative_prompt: Option<String>,
    pub seed: Option<u32>,
}

impl GenerationParams {
    /// Validate and fill in defaults.
    fn into_request(self) -> Result<GenerationRequest, WorkflowError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(WorkflowError::Validation("Prompt is required".into()));
        }
        if prompt.chars().count() > MAX_PROMPT_LEN {
            return Err(WorkflowError::Validation(format!(
                "Prompt must be at most {MAX_PROMPT_LEN} characters"
            )));
        }
        let style_id = self.style_id.trim().to_string();
        if style_id.is_empty() {
            return Err(WorkflowError::Validation("style_id is required".into()));
        }
        let aspect_ratio = self
            .aspect_ratio
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string());
        validate_aspect_ratio(&aspect_ratio)?;

        Ok(GenerationRequest {
            prompt,
            style_id,
            quality: self.quality.unwrap_or_default(),
            aspect_ratio,
            enhance_prompt: self.enhance_prompt.unwrap_or(true),
            seed: self
                .seed
                .unwrap_or_else(|| rand::rng().random_range(0..MAX_RANDOM_SEED)),
            negative_prompt: self.negative_prompt.unwrap_or_default(),
            custom_reference_id: self.character_id.filter(|c| !c.trim().is_empty()),
        })
    }
}

impl Pipeline {
    /// Start a generation job and detach its poll.
    pub async fn start_generation(
        &self,
        owner_id: DbId,
        params: GenerationParams,
    ) -> Result<GenerationJob, WorkflowError> {
        let request = params.into_request()?;

        let usage = self.usage.snapshot(owner_id).await?;
        ensure_can_generate(usage.monthly_generations, usage.tier, 1)?;

        if let Some(character_id) = request.custom_reference_id.as_deref() {
            self.ensure_character_exists(character_id).await?;
        }

        let job = self
            .generation_jobs
            .create(&CreateGenerationJob {
                id: generation_job_id(owner_id, chrono::Utc::now()),
                owner_id,
                prompt: request.prompt.clone(),
                style_id: request.style_id.clone(),
                character_id: request.custom_reference_id.clone(),
                quality: request.quality.as_str().to_string(),
                aspect_ratio: request.aspect_ratio.clone(),
            })
            .await?;

        let task_id = match self.provider.submit_generation(&request).await {
            Ok(task_id) => task_id,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Generation submission failed");
                self.fail_generation_record(&job.id, GenerationStatus::Failed, &format!("Submission failed: {e}"))
                    .await;
                return Err(WorkflowError::RemoteSubmission(e));
            }
        };
        self.generation_jobs.set_remote_task_id(&job.id, &task_id).await?;

        let mut job = job;
        job.remote_task_id = Some(task_id.clone());
        tracing::info!(job_id = %job.id, task_id = %task_id, "Generation submitted, polling in background");
        self.spawn_generation_poll(job.clone(), task_id);
        Ok(job)
    }

    /// Reject a generation that references a character the provider no
    /// longer knows, retiring every training job that produced it.
    async fn ensure_character_exists(&self, character_id: &str) -> Result<(), WorkflowError> {
        match self.provider.character_exists(character_id).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                match self
                    .training_jobs
                    .fail_by_external_id(character_id, "Character no longer exists on provider")
                    .await
                {
                    Ok(n) => tracing::warn!(character_id, retired = n, "Referenced character is gone"),
                    Err(e) => tracing::error!(character_id, error = %e, "Failed to retire missing character"),
                }
                Err(WorkflowError::Validation(format!(
                    "Character '{character_id}' is no longer available. Please retrain the model"
                )))
            }
            Err(e) => Err(WorkflowError::RemoteSubmission(e)),
        }
    }

    pub(crate) fn spawn_generation_poll(&self, job: GenerationJob, task_id: String) {
        let pipeline = self.clone();
        self.runner.spawn("generation_poll", async move {
            pipeline.run_generation(job, task_id).await;
        });
    }

    /// Detached phase.
    async fn run_generation(&self, job: GenerationJob, task_id: String) {
        let result = run_generation_poll(self.provider.as_ref(), &task_id, &self.generation_poll).await;

        let message = match result {
            Ok(outcome) => match self.store_results(&job, &outcome).await {
                Some(message) => message,
                None => return,
            },
            Err(e) => {
                let (status, rejected) = match e {
                    PollError::ContentRejected(_) => (GenerationStatus::ContentRejected, true),
                    PollError::Timeout { .. } | PollError::RemoteFailure(_) => {
                        (GenerationStatus::Failed, false)
                    }
                };
                tracing::warn!(job_id = %job.id, task_id = %task_id, status = %status, error = %e, "Generation did not complete");
                let detail = e.to_string();
                if !self.fail_generation_record(&job.id, status, &detail).await {
                    return;
                }
                PushMessage::generation_failed(&job.id, &detail, rejected)
            }
        };

        self.notifier.notify(job.owner_id, &message).await;
    }

    /// Copy provider images into the blob store and complete the record.
    /// Returns the notification to send, or `None` when nothing should be sent.
    async fn store_results(&self, job: &GenerationJob, outcome: &GenerationOutcome) -> Option<PushMessage> {
        let namespace = job.character_id.as_deref().unwrap_or(&job.style_id);
        let prefix = generations_prefix(job.owner_id, namespace);

        let mut keys = Vec::with_capacity(outcome.image_urls.len());
        let mut urls = Vec::with_capacity(outcome.image_urls.len());
        for (index, remote_url) in outcome.image_urls.iter().enumerate() {
            let bytes = match self.provider.download(remote_url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(job_id = %job.id, index, error = %e, "Failed to download generated image");
                    continue;
                }
            };
            let content_type = sniff_image(&bytes).unwrap_or("image/jpeg");
            match self.blobs.put(bytes, &prefix, content_type).await {
                Ok(stored) => {
                    keys.push(stored.key);
                    urls.push(stored.url);
                }
                Err(e) => {
                    tracing::warn!(job_id = %job.id, index, error = %e, "Failed to store generated image");
                }
            }
        }

        if keys.is_empty() {
            let detail = "Failed to store any generated image";
            if !self.fail_generation_record(&job.id, GenerationStatus::Failed, detail).await {
                return None;
            }
            return Some(PushMessage::generation_failed(&job.id, detail, false));
        }

        match self
            .generation_jobs
            .complete(&job.id, &keys, Some(&outcome.batch_id))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(job_id = %job.id, "Job already terminal, dropping generation result");
                return None;
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Failed to record generation completion");
                let detail = format!("Failed to record generation result: {e}");
                if !self.fail_generation_record(&job.id, GenerationStatus::Failed, &detail).await {
                    return None;
                }
                return Some(PushMessage::generation_failed(&job.id, &detail, false));
            }
        }
        tracing::info!(job_id = %job.id, images = keys.len(), "Generation completed");

        let count = keys.len() as i32;
        if let Err(e) = self
            .usage
            .record_generation(
                job.owner_id,
                count,
                json!({ "generation_id": job.id, "style_id": job.style_id, "batch_id": outcome.batch_id }),
            )
            .await
        {
            tracing::warn!(job_id = %job.id, error = %e, "Failed to record generation usage");
        }

        Some(PushMessage::generation_completed(&job.id, &urls))
    }

    /// Write a failure status. Returns `true` if the record changed.
    pub(crate) async fn fail_generation_record(
        &self,
        id: &str,
        status: GenerationStatus,
        detail: &str,
    ) -> bool {
        match self.generation_jobs.fail(id, status, detail).await {
            Ok(changed) => {
                if !changed {
                    tracing::warn!(job_id = id, "Generation job already terminal");
                }
                changed
            }
            Err(e) => {
                tracing::error!(job_id = id, error = %e, "Failed to record generation failure");
                false
            }
        }
    }
}
