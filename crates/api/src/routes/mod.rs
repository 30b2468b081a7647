pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{devices, generation, onboarding, training};
use crate::state::AppState;
use crate::upload::MAX_UPLOAD_BYTES;

/// Build the `/api/v1` route tree. Every route requires a Bearer token.
///
/// ```text
/// POST   /train                          start training from uploaded photos (multipart)
/// GET    /train                          list own training jobs
/// GET    /train/{id}                     one training job
///
/// POST   /onboarding/batch-upload        store 15..=25 photos in a temp folder (multipart)
/// POST   /onboarding/train               start training from a temp folder
///
/// POST   /generate                       start a generation job
/// GET    /generate/{id}                  one generation job with result URLs
///
/// POST   /devices                        register a push device token
/// ```
pub fn api_routes() -> Router<AppState> {
    let upload_limit = DefaultBodyLimit::max(MAX_UPLOAD_BYTES);

    Router::new()
        .route(
            "/train",
            post(training::create)
                .layer(upload_limit)
                .get(training::list),
        )
        .route("/train/{id}", get(training::get_by_id))
        .route(
            "/onboarding/batch-upload",
            post(onboarding::batch_upload).layer(upload_limit),
        )
        .route("/onboarding/train", post(onboarding::train))
        .route("/generate", post(generation::create))
        .route("/generate/{id}", get(generation::get_by_id))
        .route("/devices", post(devices::register))
}
