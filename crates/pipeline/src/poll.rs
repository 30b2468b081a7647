//! Poll loop turning a provider task into a local terminal outcome.
//!
//! [`poll_until`] is shared by both job kinds; [`classify_training`] and
//! [`classify_generation`] decide what one fetched response means. A fetch
//! that errors counts as a pending attempt, so transient network failures
//! and "not ready yet" both consume the same budget.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use twyn_provider::messages::TaskResponse;
use twyn_provider::RemoteJobClient;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Fixed-interval poll budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two consecutive fetches.
    pub interval: Duration,
    /// Total number of fetches before giving up.
    pub max_attempts: u32,
}

/// Character training: 180 fetches, 10 s apart (about 30 minutes).
pub const TRAINING_POLL: PollConfig = PollConfig {
    interval: Duration::from_secs(10),
    max_attempts: 180,
};

/// Image generation: 60 fetches, 10 s apart (about 10 minutes).
pub const GENERATION_POLL: PollConfig = PollConfig {
    interval: Duration::from_secs(10),
    max_attempts: 60,
};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal failure of a poll loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    /// The budget ran out without a terminal remote status.
    #[error("Timed out after {attempts} poll attempts")]
    Timeout { attempts: u32 },

    /// The provider reported the task as failed.
    #[error("Remote task failed: {0}")]
    RemoteFailure(String),

    /// The provider refused the content.
    #[error("Content rejected: {0}")]
    ContentRejected(String),
}

/// What one fetched response means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    Done(T),
    Pending,
    Failed(PollError),
}

/// Successful training result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingOutcome {
    pub external_id: String,
    pub thumbnail_url: Option<String>,
}

/// Successful generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// One URL per completed sub-job, in sub-job order.
    pub image_urls: Vec<String>,
    pub batch_id: String,
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Fetch, classify and sleep until a terminal step or the budget runs out.
///
/// The delay sits between attempts only, so an exhausted budget of `n`
/// attempts spends `(n - 1) * interval` sleeping.
pub async fn poll_until<R, E, T, F, Fut, C>(
    config: &PollConfig,
    task_id: &str,
    mut fetch: F,
    classify: C,
) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
    C: Fn(R) -> PollStep<T>,
{
    for attempt in 1..=config.max_attempts {
        match fetch().await {
            Ok(response) => match classify(response) {
                PollStep::Done(value) => {
                    tracing::debug!(task_id, attempt, "Remote task reached success");
                    return Ok(value);
                }
                PollStep::Failed(err) => {
                    tracing::debug!(task_id, attempt, error = %err, "Remote task reached failure");
                    return Err(err);
                }
                PollStep::Pending => {
                    tracing::debug!(task_id, attempt, max_attempts = config.max_attempts, "Remote task still pending");
                }
            },
            Err(e) => {
                tracing::warn!(task_id, attempt, error = %e, "Poll fetch failed, counting as pending");
            }
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    Err(PollError::Timeout {
        attempts: config.max_attempts,
    })
}

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

fn is_failure(status: &str) -> bool {
    matches!(status, "failed" | "error")
}

/// Training reports one top-level status.
pub fn classify_training(task_id: &str, response: TaskResponse) -> PollStep<TrainingOutcome> {
    match response.status.as_deref() {
        Some("completed") => PollStep::Done(TrainingOutcome {
            external_id: response
                .id
                .or(response.character_id)
                .unwrap_or_else(|| task_id.to_string()),
            thumbnail_url: response.thumbnail_url.filter(|u| !u.is_empty()),
        }),
        Some(status) if is_failure(status) => PollStep::Failed(PollError::RemoteFailure(
            response.error.unwrap_or_else(|| "Unknown error".to_string()),
        )),
        _ => PollStep::Pending,
    }
}

/// Generation reports one status per sub-job. Precedence is
/// completed > failed > nsfw > pending; nsfw only ends the loop when no
/// sub-job is still pending.
pub fn classify_generation(task_id: &str, response: TaskResponse) -> PollStep<GenerationOutcome> {
    let jobs = &response.jobs;

    if jobs.iter().any(|j| j.status() == "completed") {
        let image_urls: Vec<String> = jobs
            .iter()
            .filter(|j| j.status() == "completed")
            .filter_map(|j| j.image_url().map(str::to_string))
            .collect();
        if image_urls.is_empty() {
            tracing::warn!(task_id, "Completed sub-jobs carried no image URL yet");
            return PollStep::Pending;
        }
        return PollStep::Done(GenerationOutcome {
            image_urls,
            batch_id: response.id.clone().unwrap_or_else(|| task_id.to_string()),
        });
    }

    if let Some(failed) = jobs.iter().find(|j| is_failure(j.status())) {
        return PollStep::Failed(PollError::RemoteFailure(
            failed
                .error
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string()),
        ));
    }

    let any_nsfw = jobs.iter().any(|j| j.status() == "nsfw");
    let any_pending = jobs.iter().any(|j| j.status() != "nsfw");
    if any_nsfw && !any_pending {
        return PollStep::Failed(PollError::ContentRejected(
            "Generated content was flagged by the provider's safety filter".to_string(),
        ));
    }

    PollStep::Pending
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Poll a training task until the character is ready.
pub async fn run_training_poll(
    client: &dyn RemoteJobClient,
    task_id: &str,
    config: &PollConfig,
) -> Result<TrainingOutcome, PollError> {
    poll_until(
        config,
        task_id,
        || client.fetch_task(task_id),
        |response| classify_training(task_id, response),
    )
    .await
}

/// Poll a generation task until at least one image is ready.
pub async fn run_generation_poll(
    client: &dyn RemoteJobClient,
    task_id: &str,
    config: &PollConfig,
) -> Result<GenerationOutcome, PollError> {
    poll_until(
        config,
        task_id,
        || client.fetch_task(task_id),
        |response| classify_generation(task_id, response),
    )
    .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use assert_matches::assert_matches;
    use tokio::time::Instant;

    use super::*;

    fn task(json: &str) -> TaskResponse {
        serde_json::from_str(json).unwrap()
    }

    /// Serve `responses` in order, repeating the last one forever. Returns
    /// the loop result and the number of fetches made.
    async fn run_scripted<T>(
        config: PollConfig,
        responses: Vec<Result<TaskResponse, String>>,
        classify: impl Fn(TaskResponse) -> PollStep<T>,
    ) -> (Result<T, PollError>, usize) {
        let calls = Cell::new(0usize);
        let result = poll_until(
            &config,
            "task-1",
            || {
                let n = calls.get();
                calls.set(n + 1);
                let response = responses[n.min(responses.len() - 1)].clone();
                async move { response }
            },
            classify,
        )
        .await;
        (result, calls.get())
    }

    fn pending() -> Result<TaskResponse, String> {
        Ok(task(r#"{"status":"processing"}"#))
    }

    #[tokio::test(start_paused = true)]
    async fn training_success_stops_fetching() {
        let mut responses = vec![pending(), pending(), pending()];
        responses.push(Ok(task(
            r#"{"status":"completed","id":"char_42","thumbnail_url":"https://x/thumb.jpg"}"#,
        )));

        let (result, calls) =
            run_scripted(TRAINING_POLL, responses, |r| classify_training("task-1", r)).await;

        assert_eq!(
            result.unwrap(),
            TrainingOutcome {
                external_id: "char_42".into(),
                thumbnail_url: Some("https://x/thumb.jpg".into()),
            }
        );
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn training_times_out_after_full_budget() {
        let start = Instant::now();
        let (result, calls) =
            run_scripted(TRAINING_POLL, vec![pending()], |r| classify_training("task-1", r)).await;

        assert_matches!(result, Err(PollError::Timeout { attempts: 180 }));
        assert_eq!(calls, 180);
        assert_eq!(start.elapsed(), Duration::from_secs(10 * 179));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_errors_are_retried() {
        let responses = vec![
            Err("connection reset".to_string()),
            Err("502 from gateway".to_string()),
            Ok(task(r#"{"status":"completed","character_id":"c-9"}"#)),
        ];
        let (result, calls) =
            run_scripted(TRAINING_POLL, responses, |r| classify_training("task-1", r)).await;

        assert_eq!(result.unwrap().external_id, "c-9");
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn training_remote_failure_aborts() {
        let responses = vec![pending(), Ok(task(r#"{"status":"error","error":"bad photos"}"#))];
        let (result, calls) =
            run_scripted(TRAINING_POLL, responses, |r| classify_training("task-1", r)).await;

        assert_eq!(result, Err(PollError::RemoteFailure("bad photos".into())));
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn structured_training_error_aborts_on_first_fetch() {
        let responses = vec![Ok(task(
            r#"{"status":"failed","error":{"message":"not enough faces"}}"#,
        ))];
        let (result, calls) =
            run_scripted(TRAINING_POLL, responses, |r| classify_training("task-1", r)).await;

        assert_eq!(result, Err(PollError::RemoteFailure("not enough faces".into())));
        assert_eq!(calls, 1);
    }

    #[test]
    fn structured_sub_job_error_is_remote_failure() {
        let step = classify_generation(
            "t",
            task(r#"{"jobs":[{"status":"failed","error":{"message":"gpu lost"}},{"status":"nsfw"}]}"#),
        );
        assert_eq!(step, PollStep::Failed(PollError::RemoteFailure("gpu lost".into())));
    }

    #[test]
    fn training_external_id_falls_back_to_task_id() {
        let step = classify_training("task-7", task(r#"{"status":"completed"}"#));
        assert_matches!(step, PollStep::Done(TrainingOutcome { external_id, thumbnail_url: None }) if external_id == "task-7");
    }

    #[test]
    fn generation_completed_beats_failed() {
        let step = classify_generation(
            "t",
            task(r#"{"id":"b-1","jobs":[
                {"status":"completed","results":{"raw":{"url":"https://a/1.jpg"}}},
                {"status":"failed","error":"gpu"}
            ]}"#),
        );
        assert_eq!(
            step,
            PollStep::Done(GenerationOutcome {
                image_urls: vec!["https://a/1.jpg".into()],
                batch_id: "b-1".into(),
            })
        );
    }

    #[test]
    fn generation_raw_preferred_min_fallback() {
        let step = classify_generation(
            "t",
            task(r#"{"jobs":[
                {"status":"completed","results":{"raw":{"url":"https://a/1.jpg"}}},
                {"status":"completed","results":{"min":{"url":"https://a/2.jpg"}}}
            ]}"#),
        );
        assert_matches!(step, PollStep::Done(out) => {
            assert_eq!(out.image_urls, vec!["https://a/1.jpg", "https://a/2.jpg"]);
            assert_eq!(out.batch_id, "t");
        });
    }

    #[test]
    fn generation_failed_beats_nsfw() {
        let step = classify_generation(
            "t",
            task(r#"{"jobs":[{"status":"nsfw"},{"status":"error","error":"oom"}]}"#),
        );
        assert_eq!(step, PollStep::Failed(PollError::RemoteFailure("oom".into())));
    }

    #[test]
    fn generation_nsfw_waits_for_pending() {
        let step = classify_generation("t", task(r#"{"jobs":[{"status":"nsfw"},{"status":"pending"}]}"#));
        assert_eq!(step, PollStep::Pending);
    }

    #[test]
    fn generation_all_nsfw_is_rejected() {
        let step = classify_generation("t", task(r#"{"jobs":[{"status":"nsfw"},{"status":"nsfw"}]}"#));
        assert_matches!(step, PollStep::Failed(PollError::ContentRejected(_)));
    }

    #[test]
    fn generation_empty_or_imageless_is_pending() {
        assert_eq!(classify_generation("t", task(r#"{"jobs":[]}"#)), PollStep::Pending);
        assert_eq!(classify_generation("t", task(r#"{"status":"queued"}"#)), PollStep::Pending);
        assert_eq!(
            classify_generation("t", task(r#"{"jobs":[{"status":"completed","results":{}}]}"#)),
            PollStep::Pending
        );
    }

    #[tokio::test(start_paused = true)]
    async fn generation_times_out_after_sixty_attempts() {
        let (result, calls) = run_scripted(
            GENERATION_POLL,
            vec![Ok(task(r#"{"jobs":[{"status":"nsfw"},{"status":"queued"}]}"#))],
            |r| classify_generation("t", r),
        )
        .await;
        assert_matches!(result, Err(PollError::Timeout { attempts: 60 }));
        assert_eq!(calls, 60);
    }
}
