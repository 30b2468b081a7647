//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Status-changing updates are
//! guarded by `WHERE status = ANY(...)` so an illegal transition affects no
//! rows and is reported as `false` rather than applied.

pub mod device_token_repo;
pub mod generation_job_repo;
pub mod training_job_repo;
pub mod user_repo;

pub use device_token_repo::DeviceTokenRepo;
pub use generation_job_repo::GenerationJobRepo;
pub use training_job_repo::TrainingJobRepo;
pub use user_repo::UserRepo;
