use async_trait::async_trait;
use mantis_types::{RunRequest, RunResponse, ThreadScope};
use tracing::{debug, error};

use crate::envelope;
use crate::error::{ErrorContext, Result};
use crate::http::ApiClient;
use crate::traits::RunsApi;

const CREATE_RUN: ErrorContext = ErrorContext {
    operation: "create run",
    bad_request: None,
    unauthorized: Some("You must be logged in to create runs"),
    forbidden: "You do not have permission to create runs in this thread",
    not_found: "Thread not found or you do not have access to it",
};

const GET_RUN: ErrorContext = ErrorContext {
    operation: "get run status",
    bad_request: Some("Invalid run ID or request parameters"),
    unauthorized: None,
    forbidden: "You do not have permission to view this run",
    not_found: "Run not found or you do not have access to it",
};

fn runs_path(thread: &ThreadScope) -> String {
    format!(
        "/teams/{}/projects/{}/threads/{}/runs",
        thread.team_id, thread.project_id, thread.thread_id
    )
}

#[async_trait]
impl RunsApi for ApiClient {
    async fn create_run(&self, thread: &ThreadScope, request: &RunRequest) -> Result<RunResponse> {
        let result: Result<RunResponse> = async {
            let body = self.post(&runs_path(thread), request).await?;
            envelope::extract::<RunResponse>(&body, &["runId"])
        }
        .await;

        match result {
            Ok(run) => {
                debug!("Created run {} on thread {} ({})", run.run_id, run.thread_id, run.status);
                Ok(run)
            }
            Err(e) => {
                error!("Error creating thread run: {}", e);
                Err(CREATE_RUN.apply(e))
            }
        }
    }

    async fn get_run_status(&self, thread: &ThreadScope, run_id: &str) -> Result<RunResponse> {
        let path = format!("{}/{}", runs_path(thread), run_id);
        let result: Result<RunResponse> = async {
            let body = self.get(&path).await?;
            envelope::extract::<RunResponse>(&body, &["runId"])
        }
        .await;

        result.map_err(|e| {
            error!("Error getting run status: {}", e);
            GET_RUN.apply(e)
        })
    }
}
