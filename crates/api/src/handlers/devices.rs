//! Handler for push device registration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use twyn_core::error::CoreError;
use twyn_db::models::device_token::{DeviceToken, RegisterDevice};
use twyn_db::models::status::DevicePlatform;
use twyn_db::repositories::{DeviceTokenRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/devices
///
/// Registering a token that already exists re-activates it and moves it to
/// the caller.
pub async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<RegisterDevice>,
) -> AppResult<(StatusCode, Json<DataResponse<DeviceToken>>)> {
    let token = input.token.trim();
    if token.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Device token is required".into(),
        )));
    }
    let platform = DevicePlatform::parse(&input.platform).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Unknown platform '{}'. Expected ios or android",
            input.platform
        )))
    })?;

    UserRepo::ensure(&state.pool, user.user_id).await?;
    let device = DeviceTokenRepo::upsert(&state.pool, user.user_id, token, platform).await?;
    tracing::info!(owner_id = %user.user_id, platform = %platform, "Registered device token");

    Ok((StatusCode::CREATED, Json(DataResponse { data: device })))
}
