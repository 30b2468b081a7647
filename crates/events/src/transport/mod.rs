//! Single-device push transports.

pub mod apns;
pub mod log_only;

use async_trait::async_trait;

use crate::{PushError, PushMessage};

#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Deliver `message` to one iOS device token. One attempt, no retry.
    async fn send(&self, device_token: &str, message: &PushMessage) -> Result<(), PushError>;
}

/// Shortened token for log lines.
pub(crate) fn token_preview(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(12)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
