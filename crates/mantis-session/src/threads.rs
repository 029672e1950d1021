use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mantis_client::{ApiError, Result, ThreadsApi};
use mantis_types::{
    ChatMessage, ProjectScope, ThreadInfo, ThreadListRequest, ThreadListResponse, ThreadPageConfig, ThreadScope,
};
use tracing::{debug, error};

use crate::cell::StateCell;

/// Fetches a thread and projects its ordered history into chat messages
pub async fn load_thread_history(api: &dyn ThreadsApi, thread: &ThreadScope) -> Result<Vec<ChatMessage>> {
    let detail = api.get_thread_details(thread).await?;
    Ok(detail
        .into_ordered_messages()
        .iter()
        .map(|message| ChatMessage::from_thread_message(&thread.project_id, message))
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadListState {
    pub threads: Vec<ThreadInfo>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub previous_cursor: Option<String>,
    pub is_loading: bool,
    /// Banner text for the last failed load
    pub error: Option<String>,
}

/// Most-recent-first thread list with cursor-driven infinite scroll
pub struct ThreadBrowser {
    api: Arc<dyn ThreadsApi>,
    scope: ProjectScope,
    page: ThreadPageConfig,
    state: StateCell<ThreadListState>,
    sentinel_visible: AtomicBool,
}

enum Direction {
    Forward,
    Backward,
}

impl ThreadBrowser {
    pub fn new(api: Arc<dyn ThreadsApi>, scope: ProjectScope, page: ThreadPageConfig) -> Self {
        Self {
            api,
            scope,
            page,
            state: StateCell::default(),
            sentinel_visible: AtomicBool::new(false),
        }
    }

    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    pub fn state(&self) -> &StateCell<ThreadListState> {
        &self.state
    }

    /// Replaces the list with the newest page
    pub async fn load_initial(&self) -> Result<usize> {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let request = ThreadListRequest::initial(self.scope.clone(), self.page.page_size);
        match self.api.list_threads(&request).await {
            Ok(page) => {
                let count = page.threads.len();
                debug!("Loaded {} threads for project {}", count, self.scope.project_id);
                self.state.update(|s| {
                    s.threads = page.threads;
                    s.has_more = page.has_more;
                    s.next_cursor = page.next_cursor;
                    s.previous_cursor = page.previous_cursor;
                    s.is_loading = false;
                });
                Ok(count)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Appends the page after `next_cursor`
    ///
    /// Returns `Ok(false)` without a request while a load is in flight, when no
    /// further page exists, or when there is no cursor to follow.
    pub async fn load_more(&self) -> Result<bool> {
        let mut cursor = None;
        self.state.update_if(|s| {
            if s.is_loading || !s.has_more || s.next_cursor.is_none() {
                return false;
            }
            cursor = s.next_cursor.clone();
            s.is_loading = true;
            s.error = None;
            true
        });
        let Some(cursor) = cursor else {
            return Ok(false);
        };

        let request = ThreadListRequest::next(self.scope.clone(), cursor, self.page.page_size);
        self.fetch_page(request, Direction::Forward).await
    }

    /// Prepends the page before `previous_cursor`
    pub async fn load_previous(&self) -> Result<bool> {
        let mut cursor = None;
        self.state.update_if(|s| {
            if s.is_loading || s.previous_cursor.is_none() {
                return false;
            }
            cursor = s.previous_cursor.clone();
            s.is_loading = true;
            s.error = None;
            true
        });
        let Some(cursor) = cursor else {
            return Ok(false);
        };

        let request = ThreadListRequest::previous(self.scope.clone(), cursor, self.page.page_size);
        self.fetch_page(request, Direction::Backward).await
    }

    /// Reports the scroll sentinel's visibility
    ///
    /// A hidden-to-visible transition loads the next page once; staying
    /// visible does not trigger another load until the sentinel is hidden again.
    pub async fn on_sentinel_visibility(&self, visible: bool) -> Result<bool> {
        let was_visible = self.sentinel_visible.swap(visible, Ordering::SeqCst);
        if !visible || was_visible {
            return Ok(false);
        }
        self.load_more().await
    }

    async fn fetch_page(&self, request: ThreadListRequest, direction: Direction) -> Result<bool> {
        match self.api.list_threads(&request).await {
            Ok(page) => {
                self.state.update(|s| merge_page(s, page, direction));
                Ok(true)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    fn record_failure(&self, e: ApiError) -> ApiError {
        error!("Failed to load threads for project {}: {}", self.scope.project_id, e);
        let message = e.to_string();
        self.state.update(|s| {
            s.is_loading = false;
            s.error = Some(message);
        });
        e
    }
}

fn merge_page(state: &mut ThreadListState, page: ThreadListResponse, direction: Direction) {
    let known = |id: &str, threads: &[ThreadInfo]| threads.iter().any(|t| t.id == id);
    match direction {
        Direction::Forward => {
            for thread in page.threads {
                if !known(&thread.id, &state.threads) {
                    state.threads.push(thread);
                }
            }
            state.has_more = page.has_more;
            state.next_cursor = page.next_cursor;
        }
        Direction::Backward => {
            let mut fresh: Vec<ThreadInfo> = page
                .threads
                .into_iter()
                .filter(|t| !known(&t.id, &state.threads))
                .collect();
            fresh.append(&mut state.threads);
            state.threads = fresh;
            state.previous_cursor = page.previous_cursor;
        }
    }
    state.is_loading = false;
}
