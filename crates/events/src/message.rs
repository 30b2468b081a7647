//! Notification payloads for job outcomes.

use serde::Serialize;
use serde_json::json;

/// Most image URLs carried in a generation-completed payload.
pub const MAX_IMAGE_URLS: usize = 4;

/// A platform-neutral push notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// Custom key/value data delivered alongside the alert.
    pub data: serde_json::Value,
    /// Notification category for actionable notifications.
    pub category: &'static str,
}

impl PushMessage {
    pub fn training_completed(model_id: impl ToString, model_name: &str) -> Self {
        Self {
            title: "Training Complete! 🎉".into(),
            body: format!("Your model \"{model_name}\" is ready to use"),
            data: json!({
                "type": "training_completed",
                "modelId": model_id.to_string(),
                "modelName": model_name,
            }),
            category: "TRAINING_COMPLETE",
        }
    }

    pub fn training_failed(model_id: impl ToString, model_name: &str) -> Self {
        Self {
            title: "Training Failed".into(),
            body: format!("Training for \"{model_name}\" could not be completed. Please try again."),
            data: json!({
                "type": "training_failed",
                "modelId": model_id.to_string(),
                "modelName": model_name,
            }),
            category: "TRAINING_FAILED",
        }
    }

    pub fn generation_completed(generation_id: &str, image_urls: &[String]) -> Self {
        let urls: Vec<&String> = image_urls.iter().take(MAX_IMAGE_URLS).collect();
        Self {
            title: "Images Ready! ✨".into(),
            body: format!("{} new images generated", image_urls.len()),
            data: json!({
                "type": "generation_completed",
                "generationId": generation_id,
                "imageCount": image_urls.len(),
                "imageUrls": urls,
            }),
            category: "GENERATION_COMPLETE",
        }
    }

    /// Failure or content rejection of a generation job.
    pub fn generation_failed(generation_id: &str, error: &str, content_rejected: bool) -> Self {
        let kind = if content_rejected {
            "content_rejected"
        } else {
            "generation_failed"
        };
        let body = if error.trim().is_empty() {
            "Image generation failed. Please try again.".to_string()
        } else {
            error.to_string()
        };
        Self {
            title: "Generation Failed ⚠️".into(),
            data: json!({
                "type": kind,
                "generationId": generation_id,
                "errorMessage": body,
            }),
            body,
            category: "GENERATION_FAILED",
        }
    }

    /// The `type` field of `data`, for logging.
    pub fn kind(&self) -> &str {
        self.data["type"].as_str().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_completed_text() {
        let msg = PushMessage::training_completed("m-1", "Portrait");
        assert_eq!(msg.title, "Training Complete! 🎉");
        assert_eq!(msg.body, "Your model \"Portrait\" is ready to use");
        assert_eq!(msg.data["modelId"], "m-1");
        assert_eq!(msg.kind(), "training_completed");
    }

    #[test]
    fn generation_completed_caps_urls() {
        let urls: Vec<String> = (0..6).map(|i| format!("https://b/{i}.jpg")).collect();
        let msg = PushMessage::generation_completed("gen_1", &urls);
        assert_eq!(msg.body, "6 new images generated");
        assert_eq!(msg.data["imageUrls"].as_array().unwrap().len(), MAX_IMAGE_URLS);
        assert_eq!(msg.data["imageCount"], 6);
    }

    #[test]
    fn generation_failed_variants() {
        let rejected = PushMessage::generation_failed("gen_1", "Content rejected", true);
        assert_eq!(rejected.kind(), "content_rejected");
        assert_eq!(rejected.body, "Content rejected");

        let failed = PushMessage::generation_failed("gen_2", "", false);
        assert_eq!(failed.kind(), "generation_failed");
        assert_eq!(failed.body, "Image generation failed. Please try again.");
    }
}
