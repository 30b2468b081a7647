//! Repository for the `device_tokens` table.

use sqlx::PgPool;
use twyn_core::types::DbId;

use crate::models::device_token::DeviceToken;
use crate::models::status::DevicePlatform;

/// Column list for `device_tokens` queries.
const COLUMNS: &str = "id, user_id, token, platform, active, created_at, updated_at";

/// Provides registration and lookup of push device tokens.
pub struct DeviceTokenRepo;

impl DeviceTokenRepo {
    /// Register a token for a user, reactivating and re-owning it if the
    /// token was seen before.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        token: &str,
        platform: DevicePlatform,
    ) -> Result<DeviceToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_tokens (user_id, token, platform, active) \
             VALUES ($1, $2, $3, TRUE) \
             ON CONFLICT (token) DO UPDATE SET \
                user_id = EXCLUDED.user_id, platform = EXCLUDED.platform, \
                active = TRUE, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceToken>(&query)
            .bind(user_id)
            .bind(token)
            .bind(platform.as_str())
            .fetch_one(pool)
            .await
    }

    /// Active tokens for a user, oldest registration first.
    pub async fn list_active(pool: &PgPool, user_id: DbId) -> Result<Vec<DeviceToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM device_tokens \
             WHERE user_id = $1 AND active \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, DeviceToken>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Mark a token inactive, e.g. after the push provider reports it unregistered.
    pub async fn deactivate(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE device_tokens SET active = FALSE, updated_at = NOW() WHERE token = $1 AND active",
        )
        .bind(token)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
