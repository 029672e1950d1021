use std::sync::Arc;

use mantis_client::{ApiError, Result, RunsApi};
use mantis_types::{PollConfig, RunRequest, RunResponse, RunStatus, ThreadScope};
use tracing::{debug, info, warn};

use crate::polling::{spawn_polling, PollHandle};

/// Observes every polled run; receives the status and the full run
pub type StatusCallback = Arc<dyn Fn(&RunStatus, &RunResponse) + Send + Sync>;

/// Drives one assistant run on an existing thread to a terminal state
#[derive(Clone)]
pub struct RunOrchestrator {
    api: Arc<dyn RunsApi>,
    config: PollConfig,
}

impl RunOrchestrator {
    pub fn new(api: Arc<dyn RunsApi>, config: PollConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub async fn create_run(&self, thread: &ThreadScope, request: &RunRequest) -> Result<RunResponse> {
        let run = self.api.create_run(thread, request).await?;
        info!("Created run {} on thread {}", run.run_id, thread.thread_id);
        Ok(run)
    }

    pub async fn get_run_status(&self, thread: &ThreadScope, run_id: &str) -> Result<RunResponse> {
        self.api.get_run_status(thread, run_id).await
    }

    /// Polls until the run reaches a terminal state or attempts run out
    ///
    /// `completed` returns the run; `failed` and `expired` fail at once. Only
    /// network-class poll errors are retried.
    pub async fn monitor_run(
        &self,
        thread: &ThreadScope,
        run_id: &str,
        on_status: Option<&(dyn Fn(&RunStatus, &RunResponse) + Send + Sync)>,
    ) -> Result<RunResponse> {
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            debug!("Polling run {} (attempt {}/{})", run_id, attempt, max_attempts);

            match self.api.get_run_status(thread, run_id).await {
                Ok(run) => {
                    if let Some(callback) = on_status {
                        callback(&run.status, &run);
                    }
                    match &run.status {
                        RunStatus::Completed => {
                            info!("Run {} completed after {} polls", run_id, attempt);
                            return Ok(run);
                        }
                        RunStatus::Failed => return Err(ApiError::RunFailed { run_id: run.run_id }),
                        RunStatus::Expired => return Err(ApiError::RunExpired { run_id: run.run_id }),
                        RunStatus::Queued | RunStatus::InProgress => {}
                        RunStatus::Other(status) => {
                            warn!("Unexpected run status '{}' for run {}, continuing", status, run_id);
                        }
                    }
                }
                Err(e) if e.is_network() && attempt < max_attempts => {
                    warn!("Network error polling run {}, retrying: {}", run_id, e);
                }
                Err(e) => return Err(e),
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        Err(ApiError::Timeout(format!(
            "Run monitoring timed out after {} attempts",
            max_attempts
        )))
    }

    /// Creates a run and monitors it; monitoring never starts if creation fails
    pub async fn create_and_monitor_run(
        &self,
        thread: &ThreadScope,
        request: &RunRequest,
        on_status: Option<&(dyn Fn(&RunStatus, &RunResponse) + Send + Sync)>,
    ) -> Result<RunResponse> {
        let run = self.create_run(thread, request).await?;
        self.monitor_run(thread, &run.run_id, on_status).await
    }

    /// Monitors on the runtime, returning a cancellable handle
    pub fn spawn_monitor(
        &self,
        thread: ThreadScope,
        run_id: String,
        on_status: Option<StatusCallback>,
    ) -> PollHandle<RunResponse> {
        let orchestrator = self.clone();
        spawn_polling(async move {
            orchestrator
                .monitor_run(&thread, &run_id, on_status.as_deref())
                .await
        })
    }
}
