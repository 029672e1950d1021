use async_trait::async_trait;
use mantis_types::{ThreadDetail, ThreadInfo, ThreadListRequest, ThreadListResponse, ThreadScope};
use serde_json::Value;
use tracing::{debug, error};

use crate::envelope;
use crate::error::{ApiError, ErrorContext, Result};
use crate::http::ApiClient;
use crate::traits::ThreadsApi;

const LIST_THREADS: ErrorContext = ErrorContext {
    operation: "fetch threads",
    bad_request: Some("Invalid request parameters"),
    unauthorized: None,
    forbidden: "You do not have permission to view threads for this project",
    not_found: "Project not found or you do not have access to it",
};

const THREAD_DETAILS: ErrorContext = ErrorContext {
    operation: "fetch thread details",
    bad_request: Some("Invalid thread ID or request parameters"),
    unauthorized: None,
    forbidden: "You do not have permission to view this thread",
    not_found: "Thread not found or you do not have access to it",
};

/// `{data: {threads}}`, `{threads}` or a bare array, all to the same page
pub(crate) fn parse_thread_page(body: &Value) -> Result<ThreadListResponse> {
    let payload = envelope::payload(body);
    if payload.is_array() {
        let threads: Vec<ThreadInfo> = envelope::decode(payload)?;
        return Ok(ThreadListResponse::single_page(threads));
    }
    let page = envelope::container(body, &["threads"])
        .map_err(|_| ApiError::invalid_format("no threads array found"))?;
    envelope::decode(page)
}

#[async_trait]
impl ThreadsApi for ApiClient {
    async fn list_threads(&self, request: &ThreadListRequest) -> Result<ThreadListResponse> {
        let path = format!(
            "/teams/{}/projects/{}/threads",
            request.scope.team_id, request.scope.project_id
        );
        let result: Result<ThreadListResponse> = async {
            let body = self.get_with_query(&path, &request.query_pairs()).await?;
            parse_thread_page(&body)
        }
        .await;

        match result {
            Ok(page) => {
                debug!("Fetched {} threads (has_more: {})", page.threads.len(), page.has_more);
                Ok(page)
            }
            Err(e) => {
                error!("Error fetching project threads: {}", e);
                Err(LIST_THREADS.apply(e))
            }
        }
    }

    async fn get_thread_details(&self, thread: &ThreadScope) -> Result<ThreadDetail> {
        let path = format!(
            "/teams/{}/projects/{}/threads/{}",
            thread.team_id, thread.project_id, thread.thread_id
        );
        let result: Result<ThreadDetail> = async {
            let body = self.get(&path).await?;
            envelope::extract::<ThreadDetail>(&body, &["thread", "messages"])
        }
        .await;

        result.map_err(|e| {
            error!("Error fetching thread details: {}", e);
            THREAD_DETAILS.apply(e)
        })
    }
}
