use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::ProjectScope;

/// Conversation summary as returned by the thread listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadInfo {
    #[serde(alias = "threadId")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "lastActivity", alias = "updatedAt")]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub first_message: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One immutable turn inside a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessage {
    #[serde(alias = "messageId")]
    pub id: String,
    pub content: String,
    pub role: MessageRole,
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "userId")]
    pub author_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Cursor-paginated thread listing query
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadListRequest {
    pub scope: ProjectScope,
    pub limit: Option<u32>,
    pub order: Option<SortOrder>,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl ThreadListRequest {
    pub fn new(scope: ProjectScope) -> Self {
        Self {
            scope,
            limit: None,
            order: None,
            after: None,
            before: None,
        }
    }

    /// Most recent threads first, no cursor
    pub fn initial(scope: ProjectScope, limit: u32) -> Self {
        Self::new(scope).limit(limit).order(SortOrder::Desc)
    }

    pub fn next(scope: ProjectScope, cursor: impl Into<String>, limit: u32) -> Self {
        Self::initial(scope, limit).after(cursor)
    }

    pub fn previous(scope: ProjectScope, cursor: impl Into<String>, limit: u32) -> Self {
        Self::initial(scope, limit).before(cursor)
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    /// Query string pairs in the order the backend documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after", after.clone()));
        }
        if let Some(before) = &self.before {
            pairs.push(("before", before.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadListResponse {
    pub threads: Vec<ThreadInfo>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub previous_cursor: Option<String>,
}

impl ThreadListResponse {
    /// A bare array is a single, final page
    pub fn single_page(threads: Vec<ThreadInfo>) -> Self {
        Self {
            threads,
            has_more: false,
            next_cursor: None,
            previous_cursor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadDetail {
    pub thread: ThreadInfo,
    pub messages: Vec<ThreadMessage>,
}

impl ThreadDetail {
    /// Messages sorted by `created_at` ascending; ties keep server order
    pub fn into_ordered_messages(self) -> Vec<ThreadMessage> {
        let mut messages = self.messages;
        messages.sort_by_key(|m| m.created_at);
        messages
    }
}
