/// Errors raised by a [`crate::BlobStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The backing service rejected or failed the operation.
    #[error("Blob store {operation} failed for '{key}': {message}")]
    Backend {
        operation: &'static str,
        key: String,
        message: String,
    },

    /// Required configuration is missing or malformed.
    #[error("Storage configuration error: {0}")]
    Config(String),
}
