//! Repository for `users` usage counters and the `usage_logs` table.

use sqlx::PgPool;
use twyn_core::limits::{generation_window_expired, GENERATION_WINDOW_DAYS};
use twyn_core::types::DbId;

use crate::models::user::{UsageAction, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, subscription_tier, model_count, monthly_generations, \
    generation_reset_date, created_at, updated_at";

/// Provides usage accounting for users.
pub struct UserRepo;

impl UserRepo {
    /// Return the user row, inserting a `free` tier row on first sight.
    ///
    /// A generation window older than [`GENERATION_WINDOW_DAYS`] is closed
    /// here, so the returned counter always belongs to the current window.
    pub async fn ensure(pool: &PgPool, id: DbId) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id) VALUES ($1) \
             ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id \
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_one(pool)
            .await?;

        let today = chrono::Utc::now().date_naive();
        if !generation_window_expired(user.generation_reset_date, today) {
            return Ok(user);
        }
        Ok(Self::reset_generations(pool, id).await?.unwrap_or(user))
    }

    /// Zero `monthly_generations` and start a new window if the current one
    /// has expired. Returns the updated row, or `None` if no reset was due.
    pub async fn reset_generations(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users \
             SET monthly_generations = 0, generation_reset_date = CURRENT_DATE, updated_at = NOW() \
             WHERE id = $1 AND generation_reset_date < CURRENT_DATE - make_interval(days => $2) \
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(GENERATION_WINDOW_DAYS as i32)
            .fetch_optional(pool)
            .await?;
        if user.is_some() {
            tracing::info!(user_id = %id, "Reset monthly generation count");
        }
        Ok(user)
    }

    pub async fn increment_model_count(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET model_count = model_count + 1, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn increment_generations(pool: &PgPool, id: DbId, count: i32) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET monthly_generations = monthly_generations + $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(count)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Append a row to `usage_logs`.
    pub async fn log_usage(
        pool: &PgPool,
        user_id: DbId,
        action: UsageAction,
        count: i32,
        metadata: Option<&serde_json::Value>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO usage_logs (user_id, action, count, metadata) VALUES ($1, $2, $3, $4)")
            .bind(user_id)
            .bind(action.as_str())
            .bind(count)
            .bind(metadata)
            .execute(pool)
            .await?;
        Ok(())
    }
}
