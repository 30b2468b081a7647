/// Primary keys for users and training jobs are UUIDs (users come from the
/// managed identity provider, training jobs are generated locally).
pub type DbId = uuid::Uuid;

/// Generation job ids are server-built strings, see [`crate::ids::generation_job_id`].
pub type GenerationId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
