//! Multipart photo upload parsing shared by the training and onboarding
//! handlers.

use std::collections::HashMap;

use axum::extract::Multipart;
use twyn_core::error::CoreError;
use twyn_pipeline::media::sniff_image;
use twyn_pipeline::Photo;

use crate::error::{AppError, AppResult};

/// Multipart field name carrying photos.
pub const IMAGES_FIELD: &str = "images";

/// Largest single photo accepted.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Whole-request cap for photo uploads (50 photos at the per-photo cap).
pub const MAX_UPLOAD_BYTES: usize = 50 * MAX_IMAGE_BYTES;

/// Parsed multipart body: text fields by name plus every photo, in order.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub photos: Vec<Photo>,
}

impl UploadForm {
    /// Trimmed value of the first of `names` that is present.
    pub fn text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|n| self.fields.get(*n))
            .map(|v| v.trim())
    }
}

/// Read every field. Photos beyond `max_images` fail the request before
/// their bytes are buffered.
pub async fn read_upload(mut multipart: Multipart, max_images: usize) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name != IMAGES_FIELD {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.fields.insert(name, value);
            continue;
        }

        if form.photos.len() == max_images {
            return Err(AppError::Core(CoreError::Validation(format!(
                "At most {max_images} images are allowed"
            ))));
        }

        let index = form.photos.len();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Image {index} exceeds {} MB",
                MAX_IMAGE_BYTES / (1024 * 1024)
            ))));
        }
        let content_type = sniff_image(&bytes).map_err(|e| match e {
            CoreError::Validation(msg) => CoreError::Validation(format!("Image {index}: {msg}")),
            other => other,
        })?;

        form.photos.push(Photo {
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
        });
    }

    Ok(form)
}
