//! Startup recovery of jobs whose poll loop died with the previous process.

use crate::Pipeline;

const INTERRUPTED: &str = "interrupted by server restart";

/// What [`Pipeline::recover_in_flight`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub resumed_training: usize,
    pub resumed_generation: usize,
    /// Jobs with no provider task id, marked failed.
    pub failed: usize,
}

impl Pipeline {
    /// Resume polling for every non-terminal job that reached the provider and
    /// fail the ones that never did. Call once at startup, before serving.
    pub async fn recover_in_flight(&self) -> Result<RecoveryReport, sqlx::Error> {
        let mut report = RecoveryReport::default();

        for job in self.training_jobs.list_in_flight().await? {
            match job.remote_task_id.clone() {
                Some(task_id) => {
                    tracing::info!(job_id = %job.id, task_id = %task_id, status = %job.status, "Resuming training poll");
                    self.spawn_training_poll(job, task_id);
                    report.resumed_training += 1;
                }
                None => {
                    self.fail_training_record(job.id, INTERRUPTED).await;
                    report.failed += 1;
                }
            }
        }

        for job in self.generation_jobs.list_processing().await? {
            match job.remote_task_id.clone() {
                Some(task_id) => {
                    tracing::info!(job_id = %job.id, task_id = %task_id, "Resuming generation poll");
                    self.spawn_generation_poll(job, task_id);
                    report.resumed_generation += 1;
                }
                None => {
                    self.fail_generation_record(
                        &job.id,
                        twyn_db::models::status::GenerationStatus::Failed,
                        INTERRUPTED,
                    )
                    .await;
                    report.failed += 1;
                }
            }
        }

        if report != RecoveryReport::default() {
            tracing::info!(
                resumed_training = report.resumed_training,
                resumed_generation = report.resumed_generation,
                failed = report.failed,
                "Recovered in-flight jobs"
            );
        }
        Ok(report)
    }
}
