//! Subscription tiers and usage limits.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Sentinel meaning "no limit".
pub const UNLIMITED: i32 = -1;

/// Length of a generation accounting window, in days.
pub const GENERATION_WINDOW_DAYS: u32 = 30;

/// Subscription tier stored in `users.subscription_tier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Pro,
}

/// Per-tier usage ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageLimits {
    pub models: i32,
    pub monthly_generations: i32,
}

impl SubscriptionTier {
    /// Parse the database column value. Unknown values fall back to `Free`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "pro" => Self::Pro,
            _ => Self::Free,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }

    pub fn limits(self) -> UsageLimits {
        match self {
            Self::Free => UsageLimits {
                models: 10,
                monthly_generations: 100,
            },
            Self::Pro => UsageLimits {
                models: UNLIMITED,
                monthly_generations: UNLIMITED,
            },
        }
    }
}

/// Whether an owner with `model_count` models may train another one.
pub fn can_create_model(model_count: i32, tier: SubscriptionTier) -> bool {
    let limit = tier.limits().models;
    limit == UNLIMITED || model_count < limit
}

/// Whether an owner may generate `requested` more images this month.
pub fn can_generate_images(monthly_generations: i32, tier: SubscriptionTier, requested: i32) -> bool {
    let limit = tier.limits().monthly_generations;
    limit == UNLIMITED || monthly_generations + requested <= limit
}

/// Whether a generation counter last reset on `reset_date` is due for a
/// reset on `today`.
pub fn generation_window_expired(reset_date: NaiveDate, today: NaiveDate) -> bool {
    today
        .checked_sub_days(Days::new(u64::from(GENERATION_WINDOW_DAYS)))
        .is_some_and(|cutoff| reset_date < cutoff)
}

/// [`can_create_model`] as a `Result`, for handlers.
pub fn ensure_can_create_model(model_count: i32, tier: SubscriptionTier) -> Result<(), CoreError> {
    if can_create_model(model_count, tier) {
        Ok(())
    } else {
        Err(CoreError::LimitExceeded(format!(
            "Model creation limit reached ({model_count}/{} on the {} tier)",
            tier.limits().models,
            tier.name()
        )))
    }
}

/// [`can_generate_images`] as a `Result`, for handlers.
pub fn ensure_can_generate(
    monthly_generations: i32,
    tier: SubscriptionTier,
    requested: i32,
) -> Result<(), CoreError> {
    if can_generate_images(monthly_generations, tier, requested) {
        Ok(())
    } else {
        Err(CoreError::LimitExceeded(format!(
            "Monthly generation limit reached ({monthly_generations}/{} on the {} tier)",
            tier.limits().monthly_generations,
            tier.name()
        )))
    }
}
