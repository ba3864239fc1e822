//! Backend API trait.
//!
//! Defines the contract the rest of the client uses to talk to the advisor
//! backend, decoupling the auth chain, chat manager and router from the HTTP
//! transport.

use crate::auth::Identity;
use crate::error::Result;
use crate::session::{ChatMessage, ChatSessionSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The assistant's answer to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    /// Backend clock, milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl ChatReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            timestamp: None,
        }
    }
}

/// Liveness payload from `/actuator/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl HealthStatus {
    pub const UP: &'static str = "UP";
    pub const DOWN: &'static str = "DOWN";

    /// The status reported when the health request itself fails.
    pub fn down() -> Self {
        Self {
            status: Self::DOWN.to_string(),
            details: serde_json::Map::new(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case(Self::UP)
    }
}

/// Operations offered by the advisor backend.
///
/// # Error policy
///
/// - Reads that only populate optional data (`list_chat_sessions`,
///   `fetch_chat_history`, `health_check`) never fail; they degrade to an
///   empty or "down" value.
/// - Mutating calls surface failures to the caller.
/// - An authentication rejection on any call clears the shared credential,
///   regardless of the return type of the call.
#[async_trait]
pub trait AdvisorApi: Send + Sync {
    /// Fetches the identity for the current credential.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if no credential is held (no request is sent)
    /// - `SessionExpired` if the backend rejects the credential
    async fn fetch_identity(&self) -> Result<Identity>;

    /// Sends one user message in the given session and returns the reply.
    async fn send_chat_message(&self, text: &str, session_id: &str) -> Result<ChatReply>;

    /// Lists the user's sessions, most recent first. Empty on failure.
    async fn list_chat_sessions(&self) -> Vec<ChatSessionSummary>;

    /// Loads the ordered messages of a session. Empty on failure.
    async fn fetch_chat_history(&self, session_id: &str) -> Vec<ChatMessage>;

    /// Replaces the user's ongoing instructions.
    async fn update_ongoing_instructions(&self, text: &str) -> Result<()>;

    /// Notifies the backend of a logout (best effort) and always clears the
    /// local credential afterwards.
    async fn logout(&self);

    /// Asks the backend for the HubSpot authorization URL.
    async fn hubspot_auth_url(&self) -> Result<String>;

    /// Exchanges a HubSpot authorization code through the backend.
    async fn submit_hubspot_code(&self, code: &str) -> Result<()>;

    /// Checks backend liveness. Reports `DOWN` on failure.
    async fn health_check(&self) -> HealthStatus;

    /// Deletes the remote history of a session.
    async fn clear_chat_history(&self, session_id: &str) -> Result<()>;

    /// Posts a synthetic inbound e-mail to the backend's webhook test hook.
    async fn test_email_webhook(&self, payload: serde_json::Value) -> Result<serde_json::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_keeps_details() {
        let health: HealthStatus =
            serde_json::from_str(r#"{"status":"UP","components":{"db":{"status":"UP"}}}"#)
                .unwrap();
        assert!(health.is_up());
        assert!(health.details.contains_key("components"));
    }

    #[test]
    fn test_down_is_not_up() {
        assert!(!HealthStatus::down().is_up());
    }

    #[test]
    fn test_chat_reply_optional_fields() {
        let reply: ChatReply = serde_json::from_str(r#"{"message":"Hi there"}"#).unwrap();
        assert_eq!(reply, ChatReply::new("Hi there"));
    }
}
