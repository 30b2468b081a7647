use twyn_core::error::CoreError;
use twyn_provider::ProviderError;
use twyn_storage::StorageError;

/// Errors surfaced to the caller before a job is detached.
///
/// Anything that goes wrong after detaching is written to the job record
/// instead and never appears here.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Malformed or missing input. Nothing was submitted.
    #[error("{0}")]
    Validation(String),

    /// The owner's subscription tier does not allow the request.
    #[error("{0}")]
    LimitExceeded(String),

    /// The provider rejected or failed the initial submission.
    #[error("Remote submission failed: {0}")]
    RemoteSubmission(#[source] ProviderError),

    /// Input blobs could not be stored or listed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The job record could not be read or written.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CoreError> for WorkflowError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LimitExceeded(msg) => WorkflowError::LimitExceeded(msg),
            CoreError::Validation(msg) => WorkflowError::Validation(msg),
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}
