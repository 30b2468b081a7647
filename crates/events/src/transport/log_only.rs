use async_trait::async_trait;

use super::{token_preview, PushTransport};
use crate::{PushError, PushMessage};

/// Transport selected when no push credentials are configured. Every send
/// succeeds after logging the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyTransport;

#[async_trait]
impl PushTransport for LogOnlyTransport {
    fn name(&self) -> &'static str {
        "log-only"
    }

    async fn send(&self, device_token: &str, message: &PushMessage) -> Result<(), PushError> {
        tracing::info!(
            device = token_preview(device_token),
            kind = message.kind(),
            title = %message.title,
            body = %message.body,
            "Push transport not configured, logging notification instead"
        );
        Ok(())
    }
}
