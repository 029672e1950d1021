use std::collections::HashSet;

use super::Reducer;
use crate::chat::ChatMessage;
use crate::run::RunStatus;

/// Run currently shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTracking {
    pub run_id: String,
    pub status: RunStatus,
}

/// Visible chat transcript plus thread selection for one project page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub selected_thread_id: Option<String>,
    pub current_thread_id: Option<String>,
    /// True from thread selection until the first run against it completes
    pub is_first_message_in_thread: bool,
    pub is_loading: bool,
    pub is_typing: bool,
    pub turn_in_flight: bool,
    pub run: Option<RunTracking>,
    pub last_completed_run_id: Option<String>,
    pub error: Option<String>,
    /// Threads already continued through a run in this session
    pub continued_threads: HashSet<String>,
    /// Bumped on every new turn so stale delayed clears are ignored
    pub generation: u64,
}

impl ChatState {
    /// Whether the next turn continues the selected thread through a run
    pub fn continues_selected_thread(&self) -> Option<&str> {
        if self.is_first_message_in_thread {
            self.selected_thread_id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub enum ChatEvent {
    TurnStarted { user_message: ChatMessage },
    RunStatusChanged { run_id: String, status: RunStatus },
    RunCompleted { thread_id: String, run_id: String, messages: Vec<ChatMessage> },
    DirectReplyReceived { thread_id: String, adopt_thread: bool, reply: ChatMessage },
    TurnFailed { error: String, notice: ChatMessage },
    TurnSettled,
    RunTrackingExpired { generation: u64 },
    ThreadSelected { thread_id: String, messages: Vec<ChatMessage> },
    HistoryReplaced { thread_id: String, messages: Vec<ChatMessage> },
    ThreadLoadFailed { error: String },
    NewConversation,
}

impl Reducer for ChatState {
    type Action = ChatEvent;

    fn reduce(mut self, event: ChatEvent) -> Self {
        match event {
            ChatEvent::TurnStarted { user_message } => {
                self.messages.push(user_message);
                self.is_loading = true;
                self.is_typing = true;
                self.turn_in_flight = true;
                self.error = None;
                self.run = None;
                self.generation += 1;
            }
            ChatEvent::RunStatusChanged { run_id, status } => {
                self.run = Some(RunTracking { run_id, status });
            }
            ChatEvent::RunCompleted {
                thread_id,
                run_id,
                messages,
            } => {
                self.messages = messages;
                self.is_first_message_in_thread = false;
                self.current_thread_id = Some(thread_id.clone());
                self.continued_threads.insert(thread_id);
                self.run = Some(RunTracking {
                    run_id: run_id.clone(),
                    status: RunStatus::Completed,
                });
                self.last_completed_run_id = Some(run_id);
            }
            ChatEvent::DirectReplyReceived {
                thread_id,
                adopt_thread,
                reply,
            } => {
                if adopt_thread {
                    self.current_thread_id = Some(thread_id.clone());
                    self.selected_thread_id = Some(thread_id);
                }
                self.messages.push(reply);
            }
            ChatEvent::TurnFailed { error, notice } => {
                self.messages.push(notice);
                self.error = Some(error);
                self.run = None;
            }
            ChatEvent::TurnSettled => {
                self.is_loading = false;
                self.is_typing = false;
                self.turn_in_flight = false;
            }
            ChatEvent::RunTrackingExpired { generation } => {
                if generation == self.generation {
                    self.run = None;
                }
            }
            ChatEvent::ThreadSelected { thread_id, messages } => {
                self.is_first_message_in_thread = !self.continued_threads.contains(&thread_id);
                self.current_thread_id = Some(thread_id.clone());
                self.selected_thread_id = Some(thread_id);
                self.messages = messages;
                self.error = None;
            }
            ChatEvent::HistoryReplaced { thread_id, messages } => {
                if self.selected_thread_id.as_deref() == Some(thread_id.as_str()) {
                    self.messages = messages;
                }
            }
            ChatEvent::ThreadLoadFailed { error } => self.error = Some(error),
            ChatEvent::NewConversation => {
                self.selected_thread_id = None;
                self.current_thread_id = None;
                self.messages.clear();
                self.is_first_message_in_thread = false;
                self.run = None;
                self.error = None;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn agent(content: &str) -> ChatMessage {
        ChatMessage::agent("p1", content, Utc::now())
    }

    fn selected(thread_id: &str) -> ChatState {
        ChatState::default().reduce(ChatEvent::ThreadSelected {
            thread_id: thread_id.into(),
            messages: vec![agent("earlier")],
        })
    }

    #[test]
    fn test_selection_arms_first_message_flag() {
        let state = selected("t1");
        assert!(state.is_first_message_in_thread);
        assert_eq!(state.continues_selected_thread(), Some("t1"));
        assert_eq!(state.current_thread_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_run_completion_disarms_flag_for_the_session() {
        let state = selected("t1")
            .reduce(ChatEvent::TurnStarted {
                user_message: ChatMessage::user("p1", "u1", "Continue please"),
            })
            .reduce(ChatEvent::RunCompleted {
                thread_id: "t1".into(),
                run_id: "r1".into(),
                messages: vec![agent("a"), agent("b"), agent("c")],
            })
            .reduce(ChatEvent::TurnSettled)
            .reduce(ChatEvent::HistoryReplaced {
                thread_id: "t1".into(),
                messages: vec![agent("a")],
            });

        assert!(!state.is_first_message_in_thread);
        assert_eq!(state.last_completed_run_id.as_deref(), Some("r1"));

        let state = state.reduce(ChatEvent::ThreadSelected {
            thread_id: "t1".into(),
            messages: vec![],
        });
        assert!(!state.is_first_message_in_thread);

        let state = state.reduce(ChatEvent::ThreadSelected {
            thread_id: "t2".into(),
            messages: vec![],
        });
        assert!(state.is_first_message_in_thread);
    }

    #[test]
    fn test_stale_tracking_clear_is_ignored() {
        let state = ChatState::default()
            .reduce(ChatEvent::TurnStarted {
                user_message: ChatMessage::user("p1", "u1", "one"),
            })
            .reduce(ChatEvent::RunStatusChanged {
                run_id: "r1".into(),
                status: RunStatus::Completed,
            });
        let stale = state.generation;

        let state = state
            .reduce(ChatEvent::TurnStarted {
                user_message: ChatMessage::user("p1", "u1", "two"),
            })
            .reduce(ChatEvent::RunStatusChanged {
                run_id: "r2".into(),
                status: RunStatus::Queued,
            })
            .reduce(ChatEvent::RunTrackingExpired { generation: stale });

        assert_eq!(state.run.as_ref().map(|r| r.run_id.as_str()), Some("r2"));
    }

    #[test]
    fn test_new_conversation_resets_selection() {
        let state = selected("t1").reduce(ChatEvent::NewConversation);
        assert!(state.selected_thread_id.is_none());
        assert!(state.current_thread_id.is_none());
        assert!(state.messages.is_empty());
        assert!(!state.is_first_message_in_thread);
    }

    #[test]
    fn test_direct_reply_adopts_new_thread() {
        let state = ChatState::default()
            .reduce(ChatEvent::TurnStarted {
                user_message: ChatMessage::user("p1", "u1", "What is this project?"),
            })
            .reduce(ChatEvent::DirectReplyReceived {
                thread_id: "t1".into(),
                adopt_thread: true,
                reply: agent("It is a roadmap"),
            })
            .reduce(ChatEvent::TurnSettled);

        assert_eq!(state.current_thread_id.as_deref(), Some("t1"));
        assert_eq!(state.selected_thread_id.as_deref(), Some("t1"));
        assert_eq!(state.messages.len(), 2);
        assert!(!state.turn_in_flight);
    }
}
