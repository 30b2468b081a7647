/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The push service rejected the notification.
    #[error("Push rejected with HTTP {status}: {reason}")]
    Rejected { status: u16, reason: String },

    /// The device token is no longer valid and should be deactivated.
    #[error("Device token is no longer registered")]
    Unregistered,

    /// Signing the provider authentication token failed.
    #[error("Provider token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Required configuration is missing or unreadable.
    #[error("Push configuration error: {0}")]
    Config(String),

    /// Device tokens could not be loaded or updated.
    #[error("Device registry error: {0}")]
    Registry(String),
}

impl From<sqlx::Error> for PushError {
    fn from(err: sqlx::Error) -> Self {
        PushError::Registry(err.to_string())
    }
}
