//! Handlers for `/onboarding`: photos are uploaded first, and training is
//! started later from the folder they landed in.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use twyn_core::ids::temp_folder_name;
use twyn_core::keys::{model_folder, training_prefix};
use twyn_core::types::DbId;
use twyn_core::validation::{validate_image_count, MAX_ONBOARDING_IMAGES, MIN_ONBOARDING_IMAGES};
use twyn_db::models::user::UsageAction;
use twyn_db::repositories::UserRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, JobAccepted};
use crate::state::AppState;
use crate::upload::read_upload;

#[derive(Debug, Serialize)]
pub struct BatchUploadResult {
    pub temp_folder_name: String,
    pub uploaded_count: usize,
    pub urls: Vec<String>,
}

/// POST /api/v1/onboarding/batch-upload
///
/// Stores 15..=25 photos under a fresh `temp_*` folder and returns its name.
pub async fn batch_upload(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<BatchUploadResult>>> {
    let form = read_upload(multipart, MAX_ONBOARDING_IMAGES).await?;
    validate_image_count(form.photos.len(), MIN_ONBOARDING_IMAGES, MAX_ONBOARDING_IMAGES)?;

    let temp_folder = temp_folder_name(chrono::Utc::now());
    let prefix = training_prefix(&model_folder(user.user_id, &temp_folder));
    let blobs = state.pipeline.blobs();

    let mut urls = Vec::with_capacity(form.photos.len());
    for photo in form.photos {
        let stored = blobs.put(photo.bytes, &prefix, &photo.content_type).await?;
        urls.push(stored.url);
    }
    tracing::info!(
        owner_id = %user.user_id,
        temp_folder = %temp_folder,
        count = urls.len(),
        "Stored onboarding photos"
    );

    UserRepo::ensure(&state.pool, user.user_id).await?;
    UserRepo::log_usage(
        &state.pool,
        user.user_id,
        UsageAction::Upload,
        urls.len() as i32,
        Some(&json!({ "temp_folder_name": temp_folder })),
    )
    .await?;

    Ok(Json(DataResponse {
        data: BatchUploadResult {
            temp_folder_name: temp_folder,
            uploaded_count: urls.len(),
            urls,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct TrainFromFolder {
    pub model_name: String,
    pub temp_folder_name: String,
}

/// POST /api/v1/onboarding/train
pub async fn train(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<TrainFromFolder>,
) -> AppResult<(StatusCode, Json<DataResponse<JobAccepted<DbId>>>)> {
    let job = state
        .pipeline
        .start_training_from_folder(user.user_id, &input.model_name, &input.temp_folder_name)
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
