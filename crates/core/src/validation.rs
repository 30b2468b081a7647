//! Request validation helpers shared by the HTTP layer and the pipeline.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

/// Fewest photos accepted by the onboarding batch upload.
pub const MIN_ONBOARDING_IMAGES: usize = 15;

/// Most photos accepted by the onboarding batch upload.
pub const MAX_ONBOARDING_IMAGES: usize = 25;

/// Most photos accepted by a direct training upload.
pub const MAX_TRAINING_IMAGES: usize = 50;

/// Default aspect ratio when the client omits one.
pub const DEFAULT_ASPECT_RATIO: &str = "3:4";

static ASPECT_RATIO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{1,2}$").expect("aspect ratio regex is valid"));

/// Output quality requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Basic,
    High,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::High => "high",
        }
    }

    /// Parse the database column value.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "basic" => Ok(Self::Basic),
            "high" => Ok(Self::High),
            other => Err(CoreError::Validation(format!(
                "Unknown quality '{other}'. Must be one of: basic, high"
            ))),
        }
    }
}

/// Validate an aspect ratio token such as `3:4` or `16:9`.
pub fn validate_aspect_ratio(ratio: &str) -> Result<(), CoreError> {
    if ASPECT_RATIO_RE.is_match(ratio) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid aspect ratio '{ratio}'. Expected W:H, e.g. 3:4"
        )))
    }
}

/// Validate the number of uploaded photos against an inclusive range.
pub fn validate_image_count(count: usize, min: usize, max: usize) -> Result<(), CoreError> {
    if count < min {
        return Err(CoreError::Validation(format!(
            "At least {min} images are required, got {count}"
        )));
    }
    if count > max {
        return Err(CoreError::Validation(format!(
            "At most {max} images are allowed, got {count}"
        )));
    }
    Ok(())
}

/// Run `validator` derive rules and fold the result into a [`CoreError`].
pub fn validate_dto<T: Validate>(dto: &T) -> Result<(), CoreError> {
    dto.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, max = 5))]
        name: String,
    }

    #[test]
    fn aspect_ratio_tokens() {
        assert!(validate_aspect_ratio("3:4").is_ok());
        assert!(validate_aspect_ratio("16:9").is_ok());
        assert!(validate_aspect_ratio("3x4").is_err());
        assert!(validate_aspect_ratio("100:1").is_err());
        assert!(validate_aspect_ratio("").is_err());
    }

    #[test]
    fn image_count_bounds() {
        assert!(validate_image_count(15, MIN_ONBOARDING_IMAGES, MAX_ONBOARDING_IMAGES).is_ok());
        assert!(validate_image_count(14, MIN_ONBOARDING_IMAGES, MAX_ONBOARDING_IMAGES).is_err());
        assert!(validate_image_count(26, MIN_ONBOARDING_IMAGES, MAX_ONBOARDING_IMAGES).is_err());
    }

    #[test]
    fn quality_round_trips_column_value() {
        assert_eq!(Quality::from_name("high").unwrap(), Quality::High);
        assert_eq!(Quality::default().as_str(), "basic");
        assert!(Quality::from_name("premium").is_err());
    }

    #[test]
    fn validate_dto_maps_to_validation_error() {
        let err = validate_dto(&Named { name: String::new() }).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(validate_dto(&Named { name: "ok".into() }).is_ok());
    }
}
