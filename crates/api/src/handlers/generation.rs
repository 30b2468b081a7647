//! Handlers for the `/generate` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use twyn_core::error::CoreError;
use twyn_core::validation::{validate_dto, Quality};
use twyn_db::models::generation_job::GenerationJob;
use twyn_db::repositories::GenerationJobRepo;
use twyn_pipeline::GenerationParams;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, JobAccepted};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    #[validate(length(min = 1))]
    pub style_id: String,
    pub character_id: Option<String>,
    pub quality: Option<Quality>,
    pub aspect_ratio: Option<String>,
    pub enhance_prompt: Option<bool>,
    pub negative_prompt: Option<String>,
    pub seed: Option<u32>,
}

impl From<GenerateRequest> for GenerationParams {
    fn from(req: GenerateRequest) -> Self {
        GenerationParams {
            prompt: req.prompt,
            style_id: req.style_id,
            character_id: req.character_id,
            quality: req.quality,
            aspect_ratio: req.aspect_ratio,
            enhance_prompt: req.enhance_prompt,
            negative_prompt: req.negative_prompt,
            seed: req.seed,
        }
    }
}

/// A generation job with its stored images resolved to public URLs.
#[derive(Debug, Serialize)]
pub struct GenerationView {
    #[serde(flatten)]
    pub job: GenerationJob,
    pub result_urls: Vec<String>,
}

/// POST /api/v1/generate
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<GenerateRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<JobAccepted<String>>>)> {
    validate_dto(&input)?;

    let job = state
        .pipeline
        .start_generation(user.user_id, input.into())
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: JobAccepted {
                id: job.id,
                status: job.status,
            },
        }),
    ))
}

/// GET /api/v1/generate/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<GenerationView>>> {
    let job = GenerationJobRepo::find_for_owner(&state.pool, user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("GenerationJob", &id)))?;

    let blobs = state.pipeline.blobs();
    let result_urls = job
        .result_image_keys
        .iter()
        .map(|key| blobs.public_url(key))
        .collect();

    Ok(Json(DataResponse {
        data: GenerationView { job, result_urls },
    }))
}
