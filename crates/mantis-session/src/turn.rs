use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use mantis_client::{ApiError, ChatApi, RunsApi, ThreadsApi};
use mantis_types::{
    ChatEvent, ChatMessage, ChatRequest, ChatState, ProjectScope, RunRequest, RunResponse, RunStatus, TurnConfig,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cell::StateCell;
use crate::runs::RunOrchestrator;
use crate::threads::load_thread_history;

pub const CHAT_UNAVAILABLE_MESSAGE: &str = "Chat endpoint not found. The chat feature may not be available yet.";
pub const CHAT_FORBIDDEN_MESSAGE: &str =
    "You don't have permission to chat with this project. Please contact your administrator.";
pub const CHAT_INVALID_MESSAGE: &str = "Invalid message format. Please check your message and try again.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("A message is already being processed")]
    TurnInProgress,
}

/// How a turn resolved; failures are also recorded in the transcript
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The selected thread was continued through a run
    RunCompleted { thread_id: String, run_id: String },
    /// The chat endpoint replied directly
    Replied { thread_id: String },
    Failed { message: String },
}

/// User-facing text for a failed turn
pub fn describe_chat_error(error: &ApiError) -> String {
    match error {
        ApiError::NotFound { .. } => CHAT_UNAVAILABLE_MESSAGE.to_string(),
        ApiError::Permission { .. } => CHAT_FORBIDDEN_MESSAGE.to_string(),
        ApiError::Validation { .. } => CHAT_INVALID_MESSAGE.to_string(),
        other => other.to_string(),
    }
}

/// Resolves user messages into assistant replies for one project
///
/// The first message after selecting a historical thread continues it through
/// a run; every other message goes to the chat endpoint directly.
pub struct ChatTurnCoordinator {
    scope: ProjectScope,
    user_id: String,
    chat: Arc<dyn ChatApi>,
    threads: Arc<dyn ThreadsApi>,
    runs: RunOrchestrator,
    config: TurnConfig,
    state: StateCell<ChatState>,
    tracking_clear: Mutex<Option<JoinHandle<()>>>,
}

impl ChatTurnCoordinator {
    pub fn new(
        scope: ProjectScope,
        user_id: impl Into<String>,
        chat: Arc<dyn ChatApi>,
        threads: Arc<dyn ThreadsApi>,
        runs: Arc<dyn RunsApi>,
        config: TurnConfig,
    ) -> Self {
        Self {
            scope,
            user_id: user_id.into(),
            chat,
            threads,
            runs: RunOrchestrator::new(runs, config.run),
            config,
            state: StateCell::default(),
            tracking_clear: Mutex::new(None),
        }
    }

    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    pub fn state(&self) -> &StateCell<ChatState> {
        &self.state
    }

    /// Sends one message and waits for it to resolve
    ///
    /// The user's message is appended before any backend call and is never
    /// retracted. Backend failures resolve to [`TurnOutcome::Failed`] after a
    /// system message is appended; only a concurrent turn is rejected.
    pub async fn send_message(&self, text: &str) -> Result<TurnOutcome, TurnError> {
        let user_message = ChatMessage::user(&self.scope.project_id, &self.user_id, text);
        if !self
            .state
            .dispatch_if(|s| !s.turn_in_flight, ChatEvent::TurnStarted { user_message })
        {
            debug!("Rejected message while a turn is in flight");
            return Err(TurnError::TurnInProgress);
        }
        self.abort_tracking_clear();
        let settle = SettleOnDrop(&self.state);

        let (selected, current) = {
            let state = self.state.borrow();
            (
                state.continues_selected_thread().map(str::to_string),
                state.current_thread_id.clone(),
            )
        };

        let result = match selected {
            Some(thread_id) => self.continue_thread(thread_id, text).await,
            None => self.direct_turn(current, text).await,
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Chat turn failed in project {}: {}", self.scope.project_id, e);
                let message = describe_chat_error(&e);
                self.state.dispatch(ChatEvent::TurnFailed {
                    error: message.clone(),
                    notice: ChatMessage::system_error(&self.scope.project_id, &message),
                });
                TurnOutcome::Failed { message }
            }
        };

        drop(settle);
        if matches!(outcome, TurnOutcome::RunCompleted { .. }) {
            self.schedule_tracking_clear();
        }
        Ok(outcome)
    }

    async fn continue_thread(&self, thread_id: String, text: &str) -> Result<TurnOutcome, ApiError> {
        info!("Continuing thread {} through a run", thread_id);
        let thread = self.scope.thread(&thread_id);
        let state = self.state.clone();
        let on_status = move |status: &RunStatus, run: &RunResponse| {
            state.dispatch(ChatEvent::RunStatusChanged {
                run_id: run.run_id.clone(),
                status: status.clone(),
            });
        };

        let run = self
            .runs
            .create_and_monitor_run(&thread, &RunRequest::new(text), Some(&on_status))
            .await?;
        let messages = load_thread_history(self.threads.as_ref(), &thread).await?;

        self.state.dispatch(ChatEvent::RunCompleted {
            thread_id: thread_id.clone(),
            run_id: run.run_id.clone(),
            messages,
        });
        Ok(TurnOutcome::RunCompleted {
            thread_id,
            run_id: run.run_id,
        })
    }

    async fn direct_turn(&self, current_thread_id: Option<String>, text: &str) -> Result<TurnOutcome, ApiError> {
        let request = ChatRequest::new(text, current_thread_id.clone());
        let reply = self.chat.send_chat_message(&self.scope, &request).await?;

        let adopt_thread = reply.is_new_thread.unwrap_or(false) || current_thread_id.is_none();
        if adopt_thread {
            info!("Adopting thread {}", reply.thread_id);
        }
        let created_at = reply.generated_at.unwrap_or_else(Utc::now);
        self.state.dispatch(ChatEvent::DirectReplyReceived {
            thread_id: reply.thread_id.clone(),
            adopt_thread,
            reply: ChatMessage::agent(&self.scope.project_id, reply.response, created_at),
        });
        Ok(TurnOutcome::Replied {
            thread_id: reply.thread_id,
        })
    }

    /// Opens a historical thread, replacing the transcript with its history
    pub async fn select_thread(&self, thread_id: &str) -> Result<(), ApiError> {
        let thread = self.scope.thread(thread_id);
        match load_thread_history(self.threads.as_ref(), &thread).await {
            Ok(messages) => {
                self.state.dispatch(ChatEvent::ThreadSelected {
                    thread_id: thread_id.to_string(),
                    messages,
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to load thread {}: {}", thread_id, e);
                self.state.dispatch(ChatEvent::ThreadLoadFailed { error: e.to_string() });
                Err(e)
            }
        }
    }

    /// Reloads the selected thread's history from the server
    pub async fn refresh_thread(&self) -> Result<(), ApiError> {
        let selected = self.state.borrow().selected_thread_id.clone();
        let Some(thread_id) = selected else {
            return Ok(());
        };
        let messages = load_thread_history(self.threads.as_ref(), &self.scope.thread(&thread_id)).await?;
        self.state.dispatch(ChatEvent::HistoryReplaced { thread_id, messages });
        Ok(())
    }

    pub fn start_new_conversation(&self) {
        self.abort_tracking_clear();
        self.state.dispatch(ChatEvent::NewConversation);
    }

    /// Keeps the completed run visible briefly, then clears run tracking
    fn schedule_tracking_clear(&self) {
        let generation = self.state.borrow().generation;
        let state = self.state.clone();
        let delay = self.config.completed_display;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.dispatch(ChatEvent::RunTrackingExpired { generation });
        });
        let previous = self
            .tracking_clear
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn abort_tracking_clear(&self) {
        if let Some(handle) = self.tracking_clear.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}

impl Drop for ChatTurnCoordinator {
    fn drop(&mut self) {
        self.abort_tracking_clear();
    }
}

/// Clears the in-flight flags however the turn ends, including cancellation
struct SettleOnDrop<'a>(&'a StateCell<ChatState>);

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.dispatch(ChatEvent::TurnSettled);
    }
}
