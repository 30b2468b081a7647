use std::sync::Arc;

use twyn_pipeline::Pipeline;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is an `Arc` or already shares on clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, for reads the pipeline does not own.
    pub pool: twyn_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Starts and tracks training and generation jobs.
    pub pipeline: Pipeline,
}
