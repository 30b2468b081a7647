//! Device token lookup.

use async_trait::async_trait;
use sqlx::PgPool;
use twyn_core::types::DbId;
use twyn_db::models::status::DevicePlatform;
use twyn_db::repositories::DeviceTokenRepo;

use crate::PushError;

/// One active device registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub token: String,
    pub platform: DevicePlatform,
}

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn active_devices(&self, owner_id: DbId) -> Result<Vec<Device>, PushError>;

    /// Stop delivering to a token the push service reported as unregistered.
    async fn deactivate(&self, token: &str) -> Result<(), PushError>;
}

/// [`DeviceRegistry`] backed by the `device_tokens` table.
#[derive(Clone)]
pub struct PgDeviceRegistry {
    pool: PgPool,
}

impl PgDeviceRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for PgDeviceRegistry {
    async fn active_devices(&self, owner_id: DbId) -> Result<Vec<Device>, PushError> {
        let rows = DeviceTokenRepo::list_active(&self.pool, owner_id).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match DevicePlatform::parse(&row.platform) {
                Some(platform) => Some(Device {
                    token: row.token,
                    platform,
                }),
                None => {
                    tracing::warn!(device_id = row.id, platform = %row.platform, "Skipping device with unknown platform");
                    None
                }
            })
            .collect())
    }

    async fn deactivate(&self, token: &str) -> Result<(), PushError> {
        DeviceTokenRepo::deactivate(&self.pool, token).await?;
        Ok(())
    }
}
