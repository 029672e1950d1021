use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thread::{MessageRole, ThreadMessage};

/// Author id used for locally synthesized error entries
pub const SYSTEM_AUTHOR_ID: &str = "system";

/// Author id used for assistant replies that carry no author of their own
pub const ASSISTANT_AUTHOR_ID: &str = "assistant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageType {
    User,
    Agent,
}

/// UI-facing projection of a chat entry
///
/// Derived either from one `ThreadMessage` or from one locally synthesized
/// entry (optimistic user message, agent reply, system error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: ChatMessageType,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn local(
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
        message_type: ChatMessageType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            content: content.into(),
            message_type,
            created_at,
        }
    }

    /// Optimistic entry for a message the user just submitted
    pub fn user(project_id: impl Into<String>, user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::local(project_id, user_id, content, ChatMessageType::User, Utc::now())
    }

    pub fn agent(project_id: impl Into<String>, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self::local(project_id, ASSISTANT_AUTHOR_ID, content, ChatMessageType::Agent, created_at)
    }

    pub fn system_error(project_id: impl Into<String>, description: impl AsRef<str>) -> Self {
        Self::local(
            project_id,
            SYSTEM_AUTHOR_ID,
            format!("Error: {}", description.as_ref()),
            ChatMessageType::Agent,
            Utc::now(),
        )
    }

    pub fn from_thread_message(project_id: &str, message: &ThreadMessage) -> Self {
        let message_type = match message.role {
            MessageRole::User => ChatMessageType::User,
            MessageRole::Assistant | MessageRole::System => ChatMessageType::Agent,
        };
        let user_id = message.author_id.clone().unwrap_or_else(|| match message.role {
            MessageRole::User => String::new(),
            MessageRole::Assistant => ASSISTANT_AUTHOR_ID.to_string(),
            MessageRole::System => SYSTEM_AUTHOR_ID.to_string(),
        });

        Self {
            id: message.id.clone(),
            project_id: project_id.to_string(),
            user_id,
            content: message.content.clone(),
            message_type,
            created_at: message.created_at,
        }
    }

    pub fn is_system(&self) -> bool {
        self.user_id == SYSTEM_AUTHOR_ID
    }
}

/// Body of `POST /Teams/{teamId}/Projects/{projectId}/Chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, thread_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            thread_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub is_new_thread: Option<bool>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_omits_missing_thread() {
        let body = serde_json::to_value(ChatRequest::new("hello", None)).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hello" }));
    }

    #[test]
    fn test_system_role_maps_to_agent() {
        let message = ThreadMessage {
            id: "m1".into(),
            content: "You are helpful".into(),
            role: MessageRole::System,
            created_at: Utc::now(),
            author_id: None,
            metadata: None,
        };

        let chat = ChatMessage::from_thread_message("p1", &message);
        assert_eq!(chat.message_type, ChatMessageType::Agent);
        assert_eq!(chat.id, "m1");
        assert!(chat.is_system());
    }

    #[test]
    fn test_system_error_is_flagged() {
        let msg = ChatMessage::system_error("p1", "boom");
        assert!(msg.is_system());
        assert_eq!(msg.content, "Error: boom");
    }
}
