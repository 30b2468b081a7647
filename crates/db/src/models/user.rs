//! User usage-accounting row.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use twyn_core::limits::SubscriptionTier;
use twyn_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub subscription_tier: String,
    pub model_count: i32,
    pub monthly_generations: i32,
    /// First day of the current generation window.
    pub generation_reset_date: NaiveDate,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn tier(&self) -> SubscriptionTier {
        SubscriptionTier::from_name(&self.subscription_tier)
    }
}

/// Values accepted by `usage_logs.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageAction {
    Generate,
    Train,
    Upload,
}

impl UsageAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Train => "train",
            Self::Upload => "upload",
        }
    }
}
