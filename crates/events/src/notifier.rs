//! Best-effort fan-out of one message to all of an owner's devices.

use std::sync::Arc;

use twyn_core::types::DbId;
use twyn_db::models::status::DevicePlatform;

use crate::transport::{token_preview, PushTransport};
use crate::{DeviceRegistry, PushError, PushMessage};

/// One device that could not be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// First characters of the device token.
    pub device: String,
    pub error: String,
}

/// Outcome of [`Notifier::notify`]. Never an error; failures are itemised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Devices on platforms without a transport (Android).
    pub skipped: usize,
    pub failures: Vec<DeliveryFailure>,
    /// Set when the device list itself could not be loaded.
    pub lookup_error: Option<String>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

/// Delivers terminal-state messages. Holds no state between calls; the
/// transport is chosen once at startup.
#[derive(Clone)]
pub struct Notifier {
    registry: Arc<dyn DeviceRegistry>,
    transport: Arc<dyn PushTransport>,
}

impl Notifier {
    pub fn new(registry: Arc<dyn DeviceRegistry>, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Send `message` to every active device of `owner_id`, one attempt each.
    pub async fn notify(&self, owner_id: DbId, message: &PushMessage) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let devices = match self.registry.active_devices(owner_id).await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::error!(owner_id = %owner_id, error = %e, "Failed to load device tokens");
                report.lookup_error = Some(e.to_string());
                return report;
            }
        };

        if devices.is_empty() {
            tracing::debug!(owner_id = %owner_id, kind = message.kind(), "No registered devices");
            return report;
        }

        for device in devices {
            let preview = token_preview(&device.token).to_string();
            match device.platform {
                DevicePlatform::Android => {
                    tracing::info!(
                        owner_id = %owner_id,
                        device = %preview,
                        kind = message.kind(),
                        "Android push not implemented, skipping device"
                    );
                    report.skipped += 1;
                }
                DevicePlatform::Ios => match self.transport.send(&device.token, message).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        tracing::warn!(
                            owner_id = %owner_id,
                            device = %preview,
                            transport = self.transport.name(),
                            error = %e,
                            "Push delivery failed"
                        );
                        if matches!(e, PushError::Unregistered) {
                            if let Err(de) = self.registry.deactivate(&device.token).await {
                                tracing::warn!(device = %preview, error = %de, "Failed to deactivate device token");
                            }
                        }
                        report.failures.push(DeliveryFailure {
                            device: preview,
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        tracing::info!(
            owner_id = %owner_id,
            kind = message.kind(),
            delivered = report.delivered,
            failed = report.failures.len(),
            skipped = report.skipped,
            "Notification fan-out finished"
        );
        report
    }
}
