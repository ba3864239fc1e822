//! Chat session summaries as listed in the history view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a client-side session identifier.
///
/// The backend accepts any opaque string and uses it as the durable key for
/// all later history queries.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Summary of a conversation thread, owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionSummary {
    pub session_id: String,
    /// First words of the conversation.
    #[serde(default)]
    pub preview: String,
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: u32,
}

impl ChatSessionSummary {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            preview: String::new(),
            last_message_at: None,
            message_count: 0,
        }
    }
}
