//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the create DTO used for inserts.

pub mod device_token;
pub mod generation_job;
pub mod status;
pub mod training_job;
pub mod user;
