//! Image format sniffing for uploaded and downloaded bytes.

use image::ImageFormat;
use twyn_core::error::CoreError;

/// Content type of `bytes` if they start like a JPEG, PNG or WebP image.
pub fn sniff_image(bytes: &[u8]) -> Result<&'static str, CoreError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok("image/jpeg"),
        Ok(ImageFormat::Png) => Ok("image/png"),
        Ok(ImageFormat::WebP) => Ok("image/webp"),
        Ok(other) => Err(CoreError::Validation(format!(
            "Unsupported image format {other:?}. Use JPEG, PNG or WebP"
        ))),
        Err(_) => Err(CoreError::Validation(
            "File is not a recognizable image".to_string(),
        )),
    }
}
