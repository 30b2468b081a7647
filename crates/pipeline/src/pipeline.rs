use std::sync::Arc;

use twyn_events::Notifier;
use twyn_provider::RemoteJobClient;
use twyn_storage::BlobStore;

use crate::poll::{PollConfig, GENERATION_POLL, TRAINING_POLL};
use crate::runner::JobRunner;
use crate::store::{GenerationJobStore, TrainingJobStore, UsageStore};

/// Collaborators injected into a [`Pipeline`].
pub struct PipelineDeps {
    pub training_jobs: Arc<dyn TrainingJobStore>,
    pub generation_jobs: Arc<dyn GenerationJobStore>,
    pub usage: Arc<dyn UsageStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub provider: Arc<dyn RemoteJobClient>,
    pub notifier: Notifier,
}

/// Entry point for starting and resuming jobs. Cheap to clone; every clone
/// shares the same collaborators and [`JobRunner`].
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) training_jobs: Arc<dyn TrainingJobStore>,
    pub(crate) generation_jobs: Arc<dyn GenerationJobStore>,
    pub(crate) usage: Arc<dyn UsageStore>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) provider: Arc<dyn RemoteJobClient>,
    pub(crate) notifier: Notifier,
    pub(crate) runner: JobRunner,
    pub(crate) training_poll: PollConfig,
    pub(crate) generation_poll: PollConfig,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self {
            training_jobs: deps.training_jobs,
            generation_jobs: deps.generation_jobs,
            usage: deps.usage,
            blobs: deps.blobs,
            provider: deps.provider,
            notifier: deps.notifier,
            runner: JobRunner::new(),
            training_poll: TRAINING_POLL,
            generation_poll: GENERATION_POLL,
        }
    }

    /// Override the poll budgets.
    pub fn with_poll_configs(mut self, training: PollConfig, generation: PollConfig) -> Self {
        self.training_poll = training;
        self.generation_poll = generation;
        self
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }
}
