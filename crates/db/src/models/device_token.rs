//! Registered push device tokens.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use twyn_core::types::{DbId, Timestamp};

/// A row from the `device_tokens` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceToken {
    pub id: i64,
    pub user_id: DbId,
    pub token: String,
    pub platform: String,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /api/v1/devices`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDevice {
    pub token: String,
    pub platform: String,
}
