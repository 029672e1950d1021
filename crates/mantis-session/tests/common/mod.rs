#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mantis_client::{ApiError, ChatApi, DocumentsApi, ProgressCallback, Result, RunsApi, ThreadsApi, UploadFile};
use mantis_types::{
    ChatRequest, ChatResponse, DocumentStatus, DocumentStatusReport, MessageRole, ProjectDocument, ProjectScope,
    RunRequest, RunResponse, RunStatus, ThreadDetail, ThreadInfo, ThreadListRequest, ThreadListResponse,
    ThreadMessage, ThreadScope,
};
use serde_json::Value;

pub fn scope() -> ProjectScope {
    ProjectScope::new("team-1", "proj-1")
}

pub fn run(run_id: &str, thread_id: &str, status: RunStatus) -> RunResponse {
    RunResponse {
        run_id: run_id.to_string(),
        thread_id: thread_id.to_string(),
        status,
        created_at: None,
        started_at: None,
        completed_at: None,
        assistant_id: None,
        project_id: None,
        instructions: None,
        user_message: None,
    }
}

pub fn thread_info(id: &str) -> ThreadInfo {
    ThreadInfo {
        id: id.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        last_activity_at: None,
        message_count: 0,
        first_message: None,
        last_message: None,
        is_active: true,
        project_id: Some("proj-1".to_string()),
    }
}

/// A thread whose history alternates user and assistant turns
pub fn thread_detail(thread_id: &str, messages: usize) -> ThreadDetail {
    let messages = (0..messages)
        .map(|i| ThreadMessage {
            id: format!("{thread_id}-m{i}"),
            content: format!("message {i}"),
            role: if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant },
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, i as u32, 0).unwrap(),
            author_id: None,
            metadata: None,
        })
        .collect();
    ThreadDetail {
        thread: thread_info(thread_id),
        messages,
    }
}

pub fn page(ids: &[&str], next_cursor: Option<&str>) -> ThreadListResponse {
    ThreadListResponse {
        threads: ids.iter().map(|id| thread_info(id)).collect(),
        has_more: next_cursor.is_some(),
        next_cursor: next_cursor.map(str::to_string),
        previous_cursor: None,
    }
}

pub fn chat_reply(response: &str, thread_id: &str, is_new_thread: bool) -> ChatResponse {
    ChatResponse {
        response: response.to_string(),
        thread_id: thread_id.to_string(),
        generated_at: Some(Utc::now()),
        user_message: None,
        is_new_thread: Some(is_new_thread),
        project_id: Some("proj-1".to_string()),
        metadata: None,
    }
}

pub fn document(id: &str) -> ProjectDocument {
    ProjectDocument {
        id: id.to_string(),
        name: format!("{id}.pdf"),
        size: 1024,
        content_type: "application/pdf".to_string(),
        url: String::new(),
        uploaded_by: "user-1".to_string(),
        uploaded_at: None,
        content: None,
        metadata: None,
        processing_status: Some("processing".to_string()),
    }
}

pub fn network_error() -> ApiError {
    ApiError::Network {
        message: "Network error - please check your connection".to_string(),
    }
}

fn next<T>(script: &Mutex<VecDeque<Result<T>>>, fallback: impl FnOnce() -> Result<T>) -> Result<T> {
    script.lock().unwrap().pop_front().unwrap_or_else(fallback)
}

/// Scripted backend; each call pops the next scripted answer
#[derive(Default)]
pub struct FakeBackend {
    pub latency: Duration,

    pub create_run_error: Mutex<Option<ApiError>>,
    pub run_script: Mutex<VecDeque<Result<RunStatus>>>,
    pub runs_created: AtomicUsize,
    pub run_polls: AtomicUsize,
    pub run_requests: Mutex<Vec<(ThreadScope, RunRequest)>>,

    pub chat_script: Mutex<VecDeque<Result<ChatResponse>>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,

    pub details: Mutex<HashMap<String, ThreadDetail>>,
    pub detail_calls: AtomicUsize,
    pub page_script: Mutex<VecDeque<Result<ThreadListResponse>>>,
    pub list_requests: Mutex<Vec<ThreadListRequest>>,

    pub document_script: Mutex<VecDeque<Result<DocumentStatus>>>,
    pub status_polls: Mutex<Vec<(String, tokio::time::Instant)>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    pub fn script_runs(&self, statuses: impl IntoIterator<Item = Result<RunStatus>>) {
        self.run_script.lock().unwrap().extend(statuses);
    }

    pub fn script_chat(&self, reply: Result<ChatResponse>) {
        self.chat_script.lock().unwrap().push_back(reply);
    }

    pub fn script_pages(&self, pages: impl IntoIterator<Item = Result<ThreadListResponse>>) {
        self.page_script.lock().unwrap().extend(pages);
    }

    pub fn script_documents(&self, statuses: impl IntoIterator<Item = Result<DocumentStatus>>) {
        self.document_script.lock().unwrap().extend(statuses);
    }

    pub fn put_detail(&self, detail: ThreadDetail) {
        self.details.lock().unwrap().insert(detail.thread.id.clone(), detail);
    }

    pub fn run_polls(&self) -> usize {
        self.run_polls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl RunsApi for FakeBackend {
    async fn create_run(&self, thread: &ThreadScope, request: &RunRequest) -> Result<RunResponse> {
        self.delay().await;
        self.run_requests.lock().unwrap().push((thread.clone(), request.clone()));
        if let Some(e) = self.create_run_error.lock().unwrap().clone() {
            return Err(e);
        }
        let n = self.runs_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(run(&format!("run-{n}"), &thread.thread_id, RunStatus::Queued))
    }

    async fn get_run_status(&self, thread: &ThreadScope, run_id: &str) -> Result<RunResponse> {
        self.delay().await;
        self.run_polls.fetch_add(1, Ordering::SeqCst);
        let status = next(&self.run_script, || Ok(RunStatus::InProgress))?;
        Ok(run(run_id, &thread.thread_id, status))
    }
}

#[async_trait]
impl ChatApi for FakeBackend {
    async fn send_chat_message(&self, _scope: &ProjectScope, request: &ChatRequest) -> Result<ChatResponse> {
        self.delay().await;
        self.chat_requests.lock().unwrap().push(request.clone());
        next(&self.chat_script, || Err(ApiError::NotFound {
            message: "no scripted reply".to_string(),
        }))
    }
}

#[async_trait]
impl ThreadsApi for FakeBackend {
    async fn list_threads(&self, request: &ThreadListRequest) -> Result<ThreadListResponse> {
        self.delay().await;
        self.list_requests.lock().unwrap().push(request.clone());
        next(&self.page_script, || Ok(ThreadListResponse::default()))
    }

    async fn get_thread_details(&self, thread: &ThreadScope) -> Result<ThreadDetail> {
        self.delay().await;
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .unwrap()
            .get(&thread.thread_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                message: "Thread not found or you do not have access to it".to_string(),
            })
    }
}

#[async_trait]
impl DocumentsApi for FakeBackend {
    async fn upload_document(
        &self,
        _scope: &ProjectScope,
        file: UploadFile,
        _metadata: Option<Value>,
        _on_progress: Option<ProgressCallback>,
    ) -> Result<ProjectDocument> {
        self.delay().await;
        Ok(document(file.file_name.trim_end_matches(".pdf")))
    }

    async fn get_document_status(&self, _scope: &ProjectScope, document_id: &str) -> Result<DocumentStatusReport> {
        self.status_polls
            .lock()
            .unwrap()
            .push((document_id.to_string(), tokio::time::Instant::now()));
        let status = next(&self.document_script, || Ok(DocumentStatus::Processing))?;
        Ok(DocumentStatusReport { status, message: None })
    }
}
