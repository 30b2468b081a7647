//! Provider request and response payloads.
//!
//! Task ids and character ids are sometimes returned as numbers, so every
//! id field goes through [`lenient_id`]. Status and error fields go through
//! [`lenient_text`] because failed tasks may report an error object.

use serde::{Deserialize, Deserializer, Serialize};
use twyn_core::validation::Quality;

/// Body of `POST /higgsfield/character`.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingRequest {
    pub name: String,
    pub input_images: Vec<String>,
}

/// Body of `POST /higgsfield/text2image_soul`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub style_id: String,
    pub quality: Quality,
    pub aspect_ratio: String,
    pub enhance_prompt: bool,
    pub seed: u32,
    pub negative_prompt: String,
    /// Trained character to condition on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_reference_id: Option<String>,
}

/// Response to either submission endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, deserialize_with = "lenient_id")]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
}

impl SubmitResponse {
    pub fn into_task_id(self) -> Option<String> {
        self.task_id.or(self.id)
    }
}

/// Response of `GET /higgsfield/task/{id}/fetch`.
///
/// Training tasks report `status` at the top level; generation tasks report
/// per-item state in `jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskResponse {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub character_id: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub error: Option<String>,
    #[serde(default)]
    pub jobs: Vec<SubJob>,
}

/// One item of a generation batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubJob {
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub error: Option<String>,
    #[serde(default)]
    pub results: Option<SubJobResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubJobResults {
    #[serde(default)]
    pub raw: Option<ImageRef>,
    #[serde(default)]
    pub min: Option<ImageRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub url: Option<String>,
}

impl SubJob {
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("pending")
    }

    /// Result URL, preferring the full-quality `raw` variant over `min`.
    pub fn image_url(&self) -> Option<&str> {
        let results = self.results.as_ref()?;
        fn pick(r: &Option<ImageRef>) -> Option<&str> {
            r.as_ref()
                .and_then(|i| i.url.as_deref())
                .filter(|u| !u.is_empty())
        }
        pick(&results.raw).or_else(|| pick(&results.min))
    }
}

/// Accept a string or a number, returning it as a string.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept any JSON value as text. Objects carrying a `message` string yield
/// that message; other non-string values are rendered as JSON.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Object(map)) => match map.get("message") {
            Some(serde_json::Value::String(m)) => Some(m.clone()),
            _ => Some(serde_json::Value::Object(map).to_string()),
        },
        Some(other) => Some(other.to_string()),
    })
}
