use async_trait::async_trait;
use mantis_types::{ChatRequest, ChatResponse, ProjectScope};
use serde_json::Value;
use tracing::{debug, error};

use crate::envelope;
use crate::error::{ApiError, Result};
use crate::http::ApiClient;
use crate::traits::ChatApi;

/// Requires a non-empty `response` text and a `threadId`
pub(crate) fn parse_chat_response(body: &Value) -> Result<ChatResponse> {
    let payload = envelope::payload(body);
    if !payload.is_object() {
        return Err(ApiError::invalid_format("unexpected response structure from chat API"));
    }
    let chat: ChatResponse = envelope::decode(payload)?;
    if chat.response.trim().is_empty() || chat.thread_id.is_empty() {
        return Err(ApiError::invalid_format(format!(
            "missing required fields. Has response: {}, Has threadId: {}",
            !chat.response.trim().is_empty(),
            !chat.thread_id.is_empty()
        )));
    }
    Ok(chat)
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn send_chat_message(&self, scope: &ProjectScope, request: &ChatRequest) -> Result<ChatResponse> {
        let path = format!("/Teams/{}/Projects/{}/Chat", scope.team_id, scope.project_id);
        debug!(
            "Sending chat message to project {} (thread: {:?})",
            scope.project_id, request.thread_id
        );

        let body = self.post(&path, request).await.map_err(|e| {
            error!("Error sending chat message: {}", e);
            e
        })?;
        parse_chat_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_nested_and_flat_responses() {
        let flat = parse_chat_response(&json!({ "response": "Hi", "threadId": "t1", "isNewThread": true })).unwrap();
        let nested = parse_chat_response(&json!({ "data": { "response": "Hi", "threadId": "t1" } })).unwrap();
        assert_eq!(flat.thread_id, nested.thread_id);
        assert_eq!(flat.is_new_thread, Some(true));
    }

    #[test]
    fn test_rejects_missing_thread_id() {
        let err = parse_chat_response(&json!({ "response": "Hi" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid response format: missing required fields. Has response: true, Has threadId: false"
        );
    }
}
