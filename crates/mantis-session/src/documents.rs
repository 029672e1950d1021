use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mantis_client::{ApiError, DocumentsApi, ProgressCallback, Result, UploadFile};
use mantis_types::{DocumentPollConfig, DocumentStatus, DocumentStatusReport, ProjectDocument, ProjectScope};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cell::StateCell;
use crate::polling::{spawn_polling, PollHandle};

/// Polls a document's processing status until it settles
#[derive(Clone)]
pub struct DocumentStatusPoller {
    api: Arc<dyn DocumentsApi>,
    config: DocumentPollConfig,
}

impl DocumentStatusPoller {
    pub fn new(api: Arc<dyn DocumentsApi>, config: DocumentPollConfig) -> Self {
        Self { api, config }
    }

    /// First poll is immediate, then one per interval
    ///
    /// Stops on `completed` or `failed`, after `max_attempts` polls, after
    /// `max_consecutive_errors` failed polls in a row (returning the last
    /// error), or when the wall-clock deadline passes.
    pub async fn poll_until_settled(
        &self,
        scope: &ProjectScope,
        document_id: &str,
        on_update: Option<&(dyn Fn(&DocumentStatusReport) + Send + Sync)>,
    ) -> Result<DocumentStatusReport> {
        let deadline = self.config.deadline;
        tokio::time::timeout(deadline, self.poll(scope, document_id, on_update))
            .await
            .unwrap_or_else(|_| {
                warn!("Status polling for document {} hit its deadline", document_id);
                Err(ApiError::Timeout(format!(
                    "Processing status check timed out after {} seconds",
                    deadline.as_secs()
                )))
            })
    }

    async fn poll(
        &self,
        scope: &ProjectScope,
        document_id: &str,
        on_update: Option<&(dyn Fn(&DocumentStatusReport) + Send + Sync)>,
    ) -> Result<DocumentStatusReport> {
        let max_attempts = self.config.max_attempts;
        let mut consecutive_errors = 0;

        for attempt in 1..=max_attempts {
            match self.api.get_document_status(scope, document_id).await {
                Ok(report) => {
                    consecutive_errors = 0;
                    debug!("Document {} is {} (poll {})", document_id, report.status, attempt);
                    if let Some(callback) = on_update {
                        callback(&report);
                    }
                    if report.status.is_terminal() {
                        return Ok(report);
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    warn!(
                        "Status poll for document {} failed ({}/{}): {}",
                        document_id, consecutive_errors, self.config.max_consecutive_errors, e
                    );
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        return Err(e);
                    }
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        Err(ApiError::Timeout(format!(
            "Processing status check timed out after {} attempts",
            max_attempts
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDocument {
    pub document: ProjectDocument,
    pub status: DocumentStatus,
    pub message: Option<String>,
    pub error: Option<String>,
}

pub type DocumentBoard = BTreeMap<String, TrackedDocument>;

/// Uploaded documents of one project and their processing state
///
/// Each document has at most one polling loop; tracking it again replaces
/// (and cancels) the previous loop. Different documents poll independently.
pub struct DocumentTracker {
    api: Arc<dyn DocumentsApi>,
    scope: ProjectScope,
    poller: DocumentStatusPoller,
    board: StateCell<DocumentBoard>,
    handles: Mutex<HashMap<String, PollHandle<DocumentStatusReport>>>,
}

impl DocumentTracker {
    pub fn new(api: Arc<dyn DocumentsApi>, scope: ProjectScope, config: DocumentPollConfig) -> Self {
        Self {
            poller: DocumentStatusPoller::new(api.clone(), config),
            api,
            scope,
            board: StateCell::default(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn board(&self) -> &StateCell<DocumentBoard> {
        &self.board
    }

    pub fn document(&self, document_id: &str) -> Option<TrackedDocument> {
        self.board.borrow().get(document_id).cloned()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<String, PollHandle<DocumentStatusReport>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Uploads `file` and starts polling its processing status right away
    pub async fn upload_and_track(
        &self,
        file: UploadFile,
        metadata: Option<Value>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ProjectDocument> {
        let document = self
            .api
            .upload_document(&self.scope, file, metadata, on_progress)
            .await?;
        info!("Uploaded document {} ({})", document.id, document.name);
        self.track(document.clone());
        Ok(document)
    }

    /// Starts (or restarts) status polling for `document`
    pub fn track(&self, document: ProjectDocument) {
        let document_id = document.id.clone();
        self.board.update(|board| {
            board.insert(
                document_id.clone(),
                TrackedDocument {
                    document,
                    status: DocumentStatus::Processing,
                    message: None,
                    error: None,
                },
            );
        });

        let poller = self.poller.clone();
        let scope = self.scope.clone();
        let board = self.board.clone();
        let id = document_id.clone();
        let handle = spawn_polling(async move {
            let on_update = |report: &DocumentStatusReport| {
                board.update(|board| {
                    if let Some(entry) = board.get_mut(&id) {
                        entry.status = report.status;
                        entry.message = report.message.clone();
                    }
                });
            };
            let result = poller.poll_until_settled(&scope, &id, Some(&on_update)).await;
            if let Err(e) = &result {
                board.update(|board| {
                    if let Some(entry) = board.get_mut(&id) {
                        entry.error = Some(e.to_string());
                    }
                });
            }
            result
        });

        let mut handles = self.handles();
        handles.retain(|_, running| !running.is_finished());
        if let Some(previous) = handles.insert(document_id.clone(), handle) {
            debug!("Replacing status polling for document {}", document_id);
            previous.cancel();
        }
    }

    /// Number of polling loops still held, finished ones included until the next `track`
    pub fn tracked_loops(&self) -> usize {
        self.handles().len()
    }

    pub fn is_tracking(&self, document_id: &str) -> bool {
        self.handles()
            .get(document_id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops polling `document_id`; returns whether a loop was running
    pub fn stop(&self, document_id: &str) -> bool {
        match self.handles().remove(document_id) {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.cancel();
                running
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        for (_, handle) in self.handles().drain() {
            handle.cancel();
        }
    }

    /// Waits for the polling loop of `document_id` to finish
    pub async fn wait(&self, document_id: &str) -> Result<DocumentStatusReport> {
        let handle = self.handles().remove(document_id);
        match handle {
            Some(handle) => handle.join().await,
            None => Err(ApiError::Cancelled),
        }
    }
}
