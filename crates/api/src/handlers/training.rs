//! Handlers for the `/train` resource.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use twyn_core::error::CoreError;
use twyn_core::types::DbId;
use twyn_core::validation::MAX_TRAINING_IMAGES;
use twyn_db::models::training_job::TrainingJob;
use twyn_db::repositories::TrainingJobRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, JobAccepted};
use crate::state::AppState;
use crate::upload::read_upload;

/// POST /api/v1/train
///
/// Multipart with a `name` field and 1..=50 `images`. Returns 202 once the
/// provider has accepted the job; completion arrives as a push notification.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<JobAccepted<DbId>>>)> {
    let form = read_upload(multipart, MAX_TRAINING_IMAGES).await?;
    let name = form.text(&["name", "model_name"]).unwrap_or_default().to_string();

    let job = state
        .pipeline
        .start_training_from_uploads(user.user_id, &name, form.photos)
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

/// GET /api/v1/train
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<TrainingJob>>>> {
    let jobs = TrainingJobRepo::list_by_owner(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/train/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TrainingJob>>> {
    let job = TrainingJobRepo::find_for_owner(&state.pool, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("TrainingJob", id)))?;
    Ok(Json(DataResponse { data: job }))
}
