//! Shared response envelope types for API handlers.
//!
//! Every success body is `{ "data": ... }`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Acknowledgement for a job that was accepted and is now running in the
/// background.
#[derive(Debug, Serialize)]
pub struct JobAccepted<I: Serialize> {
    pub id: I,
    pub status: String,
}
