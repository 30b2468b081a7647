//! Long-running job orchestration.
//!
//! A request hands work to [`Pipeline`], which performs the synchronous part
//! (record creation, blob upload, provider submission) and then detaches a
//! task that polls the provider until a terminal state, writes the outcome to
//! the job record, moves training blobs into their final folder and notifies
//! the owner's devices.
//!
//! - [`poll`]: the generic poll loop and the two per-kind classifiers.
//! - [`training`] / [`generation`]: workflow drivers.
//! - [`reorganize`]: best-effort blob relocation.
//! - [`recovery`]: resumes or fails in-flight jobs at startup.
//! - [`runner`]: tracks detached tasks for graceful shutdown.

pub mod error;
pub mod generation;
pub mod media;
pub mod pipeline;
pub mod poll;
pub mod recovery;
pub mod reorganize;
pub mod runner;
pub mod store;
pub mod training;

pub use error::WorkflowError;
pub use generation::GenerationParams;
pub use pipeline::{Pipeline, PipelineDeps};
pub use poll::{PollConfig, PollError, GENERATION_POLL, TRAINING_POLL};
pub use recovery::RecoveryReport;
pub use reorganize::{reorganize, ReorganizeReport};
pub use runner::JobRunner;
pub use store::{GenerationJobStore, PgJobStore, TrainingJobStore, UsageSnapshot, UsageStore};
pub use training::Photo;
