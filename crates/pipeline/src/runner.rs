//! Detached job tracking.

use std::future::Future;
use std::time::Duration;

use tokio_util::task::TaskTracker;

/// Spawns detached workflow tasks and lets the server wait for them on
/// shutdown. Cloning shares the same tracker.
#[derive(Clone, Default)]
pub struct JobRunner {
    tracker: TaskTracker,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `future` in the background. Its failures must be handled inside.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::debug!(task = name, in_flight = self.tracker.len() + 1, "Spawning detached job");
        self.tracker.spawn(future);
    }

    /// Number of detached tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every tracked task has finished.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Stop waiting after `timeout`. Returns `true` if every task finished.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok();
        if !drained {
            tracing::warn!(
                in_flight = self.tracker.len(),
                "Shutdown timeout reached with jobs still polling; they resume on next start"
            );
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn wait_idle_returns_after_tasks_finish() {
        let runner = JobRunner::new();
        runner.spawn("sleepy", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        assert_eq!(runner.in_flight(), 1);

        runner.wait_idle().await;
        assert_eq!(runner.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_times_out_on_long_task() {
        let runner = JobRunner::new();
        runner.spawn("forever", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        assert!(!runner.shutdown(Duration::from_secs(1)).await);
    }
}
