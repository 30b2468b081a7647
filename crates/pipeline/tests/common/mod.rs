//! In-memory collaborators for driving a [`Pipeline`] without Postgres,
//! the provider or APNs.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use twyn_core::limits::SubscriptionTier;
use twyn_core::types::DbId;
use twyn_db::models::generation_job::{CreateGenerationJob, GenerationJob};
use twyn_db::models::status::{DevicePlatform, GenerationStatus, TrainingStatus};
use twyn_db::models::training_job::{CreateTrainingJob, TrainingJob};
use twyn_events::{Device, DeviceRegistry, Notifier, PushError, PushMessage, PushTransport};
use twyn_pipeline::{
    GenerationJobStore, Pipeline, PipelineDeps, PollConfig, TrainingJobStore, UsageSnapshot,
    UsageStore,
};
use twyn_provider::{
    GenerationRequest, ProviderError, RemoteJobClient, TaskResponse, TrainingRequest,
};
use twyn_storage::MemoryBlobStore;

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

pub const FAST_POLL: PollConfig = PollConfig {
    interval: Duration::from_secs(10),
    max_attempts: 5,
};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap()
}

pub fn task(value: serde_json::Value) -> TaskResponse {
    serde_json::from_value(value).unwrap()
}

// ---------------------------------------------------------------------------
// Job and usage store
// ---------------------------------------------------------------------------

/// Mirrors the repositories' status guards over plain maps.
#[derive(Default)]
pub struct MemoryJobStore {
    pub training: Mutex<HashMap<DbId, TrainingJob>>,
    pub generation: Mutex<HashMap<String, GenerationJob>>,
    pub usage: Mutex<HashMap<DbId, UsageSnapshot>>,
    pub training_usage_records: AtomicUsize,
    pub generation_usage_records: Mutex<Vec<i32>>,
    /// Write operations that return a database error.
    pub failing_writes: Mutex<Vec<&'static str>>,
}

impl MemoryJobStore {
    pub fn training_job(&self, id: DbId) -> TrainingJob {
        lock(&self.training)[&id].clone()
    }

    pub fn generation_job(&self, id: &str) -> GenerationJob {
        lock(&self.generation)[id].clone()
    }

    pub fn training_jobs(&self) -> Vec<TrainingJob> {
        lock(&self.training).values().cloned().collect()
    }

    pub fn generation_jobs(&self) -> Vec<GenerationJob> {
        lock(&self.generation).values().cloned().collect()
    }

    pub fn set_usage(&self, owner_id: DbId, snapshot: UsageSnapshot) {
        lock(&self.usage).insert(owner_id, snapshot);
    }

    pub fn insert_training(&self, job: TrainingJob) {
        lock(&self.training).insert(job.id, job);
    }

    pub fn insert_generation(&self, job: GenerationJob) {
        lock(&self.generation).insert(job.id.clone(), job);
    }

    /// Make every later call to `operation` fail with a pool timeout.
    pub fn fail_writes_to(&self, operation: &'static str) {
        lock(&self.failing_writes).push(operation);
    }

    fn check_write(&self, operation: &'static str) -> Result<(), sqlx::Error> {
        if lock(&self.failing_writes).contains(&operation) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }

    fn transition_training(
        &self,
        id: DbId,
        next: TrainingStatus,
        apply: impl FnOnce(&mut TrainingJob),
    ) -> bool {
        let mut jobs = lock(&self.training);
        match jobs.get_mut(&id) {
            Some(job) if job.status().is_some_and(|s| s.can_transition_to(next)) => {
                job.status = next.as_str().to_string();
                job.updated_at = chrono::Utc::now();
                apply(job);
                true
            }
            _ => false,
        }
    }
}

pub fn training_row(owner_id: DbId, status: TrainingStatus, task_id: Option<&str>) -> TrainingJob {
    let now = chrono::Utc::now();
    TrainingJob {
        id: uuid::Uuid::new_v4(),
        owner_id,
        display_name: "Restored".into(),
        status: status.as_str().into(),
        input_photo_count: 15,
        external_character_id: None,
        thumbnail_url: None,
        provisional_folder_key: format!("users/{owner_id}/temp_1_abcdefgh/"),
        remote_task_id: task_id.map(str::to_string),
        error_detail: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn generation_row(owner_id: DbId, id: &str, task_id: Option<&str>) -> GenerationJob {
    let now = chrono::Utc::now();
    GenerationJob {
        id: id.into(),
        owner_id,
        prompt: "a lighthouse".into(),
        style_id: "style-1".into(),
        character_id: None,
        quality: "basic".into(),
        aspect_ratio: "3:4".into(),
        status: GenerationStatus::Processing.as_str().into(),
        result_image_keys: Vec::new(),
        error_detail: None,
        remote_task_id: task_id.map(str::to_string),
        batch_id: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
    }
}

#[async_trait]
impl TrainingJobStore for MemoryJobStore {
    async fn create(&self, input: &CreateTrainingJob) -> Result<TrainingJob, sqlx::Error> {
        let now = chrono::Utc::now();
        let job = TrainingJob {
            id: input.id,
            owner_id: input.owner_id,
            display_name: input.display_name.clone(),
            status: TrainingStatus::Pending.as_str().into(),
            input_photo_count: input.input_photo_count,
            external_character_id: None,
            thumbnail_url: None,
            provisional_folder_key: input.provisional_folder_key.clone(),
            remote_task_id: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_training(job.clone());
        Ok(job)
    }

    async fn set_remote_task_id(&self, id: DbId, task_id: &str) -> Result<(), sqlx::Error> {
        if let Some(job) = lock(&self.training).get_mut(&id) {
            job.remote_task_id = Some(task_id.to_string());
        }
        Ok(())
    }

    async fn mark_training(&self, id: DbId) -> Result<bool, sqlx::Error> {
        self.check_write("mark_training")?;
        Ok(self.transition_training(id, TrainingStatus::Training, |_| {}))
    }

    async fn complete(
        &self,
        id: DbId,
        external_id: &str,
        thumbnail_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        self.check_write("complete_training")?;
        Ok(self.transition_training(id, TrainingStatus::Completed, |job| {
            job.external_character_id = Some(external_id.to_string());
            job.thumbnail_url = thumbnail_url.map(str::to_string);
        }))
    }

    async fn fail(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        Ok(self.transition_training(id, TrainingStatus::Failed, |job| {
            job.error_detail = Some(error.to_string());
        }))
    }

    async fn fail_by_external_id(&self, external_id: &str, error: &str) -> Result<u64, sqlx::Error> {
        let ids: Vec<DbId> = lock(&self.training)
            .values()
            .filter(|j| j.external_character_id.as_deref() == Some(external_id))
            .map(|j| j.id)
            .collect();
        let mut changed = 0;
        for id in ids {
            if TrainingJobStore::fail(self, id, error).await? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list_in_flight(&self) -> Result<Vec<TrainingJob>, sqlx::Error> {
        Ok(self
            .training_jobs()
            .into_iter()
            .filter(|j| j.status().is_some_and(TrainingStatus::is_in_flight))
            .collect())
    }
}

#[async_trait]
impl GenerationJobStore for MemoryJobStore {
    async fn create(&self, input: &CreateGenerationJob) -> Result<GenerationJob, sqlx::Error> {
        let mut job = generation_row(input.owner_id, &input.id, None);
        job.prompt = input.prompt.clone();
        job.style_id = input.style_id.clone();
        job.character_id = input.character_id.clone();
        job.quality = input.quality.clone();
        job.aspect_ratio = input.aspect_ratio.clone();
        self.insert_generation(job.clone());
        Ok(job)
    }

    async fn set_remote_task_id(&self, id: &str, task_id: &str) -> Result<(), sqlx::Error> {
        if let Some(job) = lock(&self.generation).get_mut(id) {
            job.remote_task_id = Some(task_id.to_string());
        }
        Ok(())
    }

    async fn complete(
        &self,
        id: &str,
        result_image_keys: &[String],
        batch_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        self.check_write("complete_generation")?;
        let mut jobs = lock(&self.generation);
        match jobs.get_mut(id) {
            Some(job) if job.status() == Some(GenerationStatus::Processing) => {
                job.status = GenerationStatus::Completed.as_str().into();
                job.result_image_keys = result_image_keys.to_vec();
                job.batch_id = batch_id.map(str::to_string);
                job.completed_at = Some(chrono::Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fail(&self, id: &str, status: GenerationStatus, error: &str) -> Result<bool, sqlx::Error> {
        let mut jobs = lock(&self.generation);
        match jobs.get_mut(id) {
            Some(job) if job.status().is_some_and(|s| s.can_transition_to(status)) => {
                job.status = status.as_str().into();
                job.error_detail = Some(error.to_string());
                job.completed_at = Some(chrono::Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_processing(&self) -> Result<Vec<GenerationJob>, sqlx::Error> {
        Ok(self
            .generation_jobs()
            .into_iter()
            .filter(|j| j.status() == Some(GenerationStatus::Processing))
            .collect())
    }
}

#[async_trait]
impl UsageStore for MemoryJobStore {
    async fn snapshot(&self, owner_id: DbId) -> Result<UsageSnapshot, sqlx::Error> {
        Ok(lock(&self.usage).get(&owner_id).copied().unwrap_or(UsageSnapshot {
            tier: SubscriptionTier::Free,
            model_count: 0,
            monthly_generations: 0,
        }))
    }

    async fn record_training(&self, _owner_id: DbId, _metadata: serde_json::Value) -> Result<(), sqlx::Error> {
        self.training_usage_records.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn record_generation(
        &self,
        _owner_id: DbId,
        image_count: i32,
        _metadata: serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        lock(&self.generation_usage_records).push(image_count);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Replays queued fetch responses. Once the queue is down to one entry that
/// entry repeats, so a single pending response keeps a task pending forever.
#[derive(Default)]
pub struct ScriptedProvider {
    pub fetches: Mutex<VecDeque<TaskResponse>>,
    pub fetch_count: AtomicUsize,
    pub reject_submissions: Mutex<bool>,
    pub missing_characters: Mutex<Vec<String>>,
    pub downloads: Mutex<HashMap<String, Vec<u8>>>,
    pub training_requests: Mutex<Vec<TrainingRequest>>,
    pub generation_requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn script(&self, responses: impl IntoIterator<Item = serde_json::Value>) {
        *lock(&self.fetches) = responses.into_iter().map(task).collect();
    }

    pub fn serve_image(&self, url: &str, bytes: &[u8]) {
        lock(&self.downloads).insert(url.to_string(), bytes.to_vec());
    }

    pub fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    fn submission(&self, task_id: &str) -> Result<String, ProviderError> {
        if *lock(&self.reject_submissions) {
            return Err(ProviderError::Api {
                status: 500,
                body: "upstream unavailable".into(),
            });
        }
        Ok(task_id.to_string())
    }
}

#[async_trait]
impl RemoteJobClient for ScriptedProvider {
    async fn submit_training(&self, request: &TrainingRequest) -> Result<String, ProviderError> {
        lock(&self.training_requests).push(request.clone());
        self.submission("train-task-1")
    }

    async fn submit_generation(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        lock(&self.generation_requests).push(request.clone());
        self.submission("gen-task-1")
    }

    async fn fetch_task(&self, _task_id: &str) -> Result<TaskResponse, ProviderError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let mut queue = lock(&self.fetches);
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(response.unwrap_or_default())
    }

    async fn character_exists(&self, character_id: &str) -> Result<bool, ProviderError> {
        Ok(!lock(&self.missing_characters).iter().any(|c| c == character_id))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        lock(&self.downloads).get(url).cloned().ok_or(ProviderError::Api {
            status: 404,
            body: format!("no such object: {url}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Every owner has one iOS device.
pub struct SingleDeviceRegistry;

#[async_trait]
impl DeviceRegistry for SingleDeviceRegistry {
    async fn active_devices(&self, _owner_id: DbId) -> Result<Vec<Device>, PushError> {
        Ok(vec![Device {
            token: "ios-device-token-0001".into(),
            platform: DevicePlatform::Ios,
        }])
    }

    async fn deactivate(&self, _token: &str) -> Result<(), PushError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<PushMessage>>,
}

impl RecordingTransport {
    pub fn messages(&self) -> Vec<PushMessage> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, _device_token: &str, message: &PushMessage) -> Result<(), PushError> {
        lock(&self.sent).push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub pipeline: Pipeline,
    pub store: Arc<MemoryJobStore>,
    pub provider: Arc<ScriptedProvider>,
    pub blobs: Arc<MemoryBlobStore>,
    pub pushes: Arc<RecordingTransport>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryJobStore::default());
        let provider = Arc::new(ScriptedProvider::default());
        let blobs = Arc::new(MemoryBlobStore::new("https://cdn.test"));
        let pushes = Arc::new(RecordingTransport::default());

        let pipeline = Pipeline::new(PipelineDeps {
            training_jobs: store.clone(),
            generation_jobs: store.clone(),
            usage: store.clone(),
            blobs: blobs.clone(),
            provider: provider.clone(),
            notifier: Notifier::new(Arc::new(SingleDeviceRegistry), pushes.clone()),
        })
        .with_poll_configs(FAST_POLL, FAST_POLL);

        Self {
            pipeline,
            store,
            provider,
            blobs,
            pushes,
        }
    }

    pub async fn settle(&self) {
        self.pipeline.runner().wait_idle().await;
    }
}
