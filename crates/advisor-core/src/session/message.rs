//! Chat message types.
//!
//! Messages are append-only: once created they are never mutated, and the
//! order of a log is insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text shown in place of an assistant reply when sending fails.
pub const SEND_FAILURE_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Represents the author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant (or the client speaking on its behalf).
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Backend id for messages loaded from history, a client-generated UUID
    /// for messages created locally.
    pub id: String,
    pub content: String,
    pub role: MessageRole,
    pub timestamp: DateTime<Utc>,
    /// Synthetic reply standing in for a failed send.
    #[serde(default)]
    pub is_error: bool,
    /// Client-side notice (e.g. confirmation of an instructions update).
    #[serde(default)]
    pub is_system: bool,
}

impl ChatMessage {
    fn local(content: impl Into<String>, role: MessageRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
            is_error: false,
            is_system: false,
        }
    }

    /// An optimistic user message, appended before the backend answers.
    pub fn user(content: impl Into<String>) -> Self {
        Self::local(content, MessageRole::User)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::local(content, MessageRole::Assistant)
    }

    /// The error-flagged assistant reply appended when a send fails.
    pub fn send_failure() -> Self {
        Self {
            is_error: true,
            ..Self::local(SEND_FAILURE_REPLY, MessageRole::Assistant)
        }
    }

    /// A system-flagged assistant notice generated by the client.
    pub fn system_notice(content: impl Into<String>) -> Self {
        Self {
            is_system: true,
            ..Self::local(content, MessageRole::Assistant)
        }
    }
}
