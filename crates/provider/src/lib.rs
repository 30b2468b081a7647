//! Remote Job Client for the character training / image generation provider.
//!
//! [`RemoteJobClient`] is the seam the pipeline polls through; [`HiggsfieldApi`]
//! is the HTTP implementation. Response payloads are kept loosely typed in
//! [`messages`] because the provider omits or renames fields between states.

pub mod client;
pub mod config;
pub mod error;
pub mod messages;

use async_trait::async_trait;

pub use client::HiggsfieldApi;
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use messages::{GenerationRequest, TaskResponse, TrainingRequest};

#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Submit a character training task. Returns the provider task id.
    async fn submit_training(&self, request: &TrainingRequest) -> Result<String, ProviderError>;

    /// Submit an image generation task. Returns the provider task id.
    async fn submit_generation(&self, request: &GenerationRequest)
        -> Result<String, ProviderError>;

    /// Fetch the current state of a task.
    async fn fetch_task(&self, task_id: &str) -> Result<TaskResponse, ProviderError>;

    /// Whether a trained character still exists on the provider.
    async fn character_exists(&self, character_id: &str) -> Result<bool, ProviderError>;

    /// Download a result image.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}
