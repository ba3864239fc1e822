//! Chat session manager.
//!
//! Holds the active conversation: its id, the ordered message log, the
//! unsent draft and the list of past sessions. Sends are not serialized; the
//! state lock is released while a request is in flight, so replies land in
//! the order the backend answers.

use advisor_core::api::AdvisorApi;
use advisor_core::auth::Identity;
use advisor_core::session::{ChatMessage, ChatSessionSummary, new_session_id};
use advisor_core::{AdvisorError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Confirmation appended after the ongoing instructions were saved.
pub const INSTRUCTIONS_UPDATED: &str = "Ongoing instructions updated successfully!";

#[derive(Debug, Default)]
struct ChatState {
    session_id: Option<String>,
    messages: Vec<ChatMessage>,
    draft: String,
    sessions: Vec<ChatSessionSummary>,
    ongoing_instructions: String,
}

/// Snapshot of the chat state for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub session_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub draft: String,
    pub sessions: Vec<ChatSessionSummary>,
}

/// Manages the active conversation and the session list.
pub struct ChatSessionManager {
    api: Arc<dyn AdvisorApi>,
    state: Mutex<ChatState>,
}

impl ChatSessionManager {
    pub fn new(api: Arc<dyn AdvisorApi>) -> Self {
        Self {
            api,
            state: Mutex::new(ChatState::default()),
        }
    }

    pub async fn snapshot(&self) -> ChatSnapshot {
        let state = self.state.lock().await;
        ChatSnapshot {
            session_id: state.session_id.clone(),
            messages: state.messages.clone(),
            draft: state.draft.clone(),
            sessions: state.sessions.clone(),
        }
    }

    pub async fn session_id(&self) -> Option<String> {
        self.state.lock().await.session_id.clone()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.messages.clone()
    }

    pub async fn draft(&self) -> String {
        self.state.lock().await.draft.clone()
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.state.lock().await.draft = text.into();
    }

    /// Clears the active session so the next message starts a new one.
    pub async fn start_new_thread(&self) {
        let mut state = self.state.lock().await;
        state.session_id = None;
        state.messages.clear();
        state.draft.clear();
        tracing::debug!("[Chat] Started new thread");
    }

    /// Sends `text` in the active session, creating one if needed.
    ///
    /// The user message is appended before the request goes out. The reply,
    /// or an error-flagged stand-in, is appended when the request settles.
    /// Blank text is ignored; anything else is sent and logged verbatim.
    ///
    /// # Returns
    ///
    /// The id of the session the message was sent in, or `None` for blank
    /// text.
    pub async fn send(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        let session_id = {
            let mut state = self.state.lock().await;
            let session_id = state
                .session_id
                .get_or_insert_with(new_session_id)
                .clone();
            state.messages.push(ChatMessage::user(text));
            state.draft.clear();
            session_id
        };

        let reply = match self.api.send_chat_message(text, &session_id).await {
            Ok(reply) => ChatMessage::assistant(reply.message),
            Err(e) => {
                tracing::error!("[Chat] Failed to send message: {}", e);
                ChatMessage::send_failure()
            }
        };

        self.state.lock().await.messages.push(reply);
        Some(session_id)
    }

    /// Makes `summary` the active session and loads its history.
    ///
    /// A failed history load yields an empty log.
    pub async fn switch_session(&self, summary: &ChatSessionSummary) {
        let history = self.api.fetch_chat_history(&summary.session_id).await;
        tracing::debug!(
            "[Chat] Switched to session {} ({} messages)",
            summary.session_id,
            history.len()
        );

        let mut state = self.state.lock().await;
        state.session_id = Some(summary.session_id.clone());
        state.messages = history;
        state.draft.clear();
    }

    /// Reloads the list of past sessions. Never fails.
    pub async fn refresh_sessions(&self) -> Vec<ChatSessionSummary> {
        let sessions = self.api.list_chat_sessions().await;
        self.state.lock().await.sessions = sessions.clone();
        sessions
    }

    /// Takes the ongoing instructions from the authenticated identity.
    pub async fn load_ongoing_instructions(&self, identity: &Identity) -> String {
        let mut state = self.state.lock().await;
        state.ongoing_instructions = identity.ongoing_instructions.clone();
        state.ongoing_instructions.clone()
    }

    pub async fn ongoing_instructions(&self) -> String {
        self.state.lock().await.ongoing_instructions.clone()
    }

    /// Saves new ongoing instructions and confirms in the message log.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure; nothing is appended in that case.
    pub async fn update_instructions(&self, text: &str) -> Result<()> {
        self.api.update_ongoing_instructions(text).await?;

        let mut state = self.state.lock().await;
        state.ongoing_instructions = text.to_string();
        state
            .messages
            .push(ChatMessage::system_notice(INSTRUCTIONS_UPDATED));
        Ok(())
    }

    /// Deletes the remote history of the active session and empties the log.
    ///
    /// # Errors
    ///
    /// `Internal` when no session is active; backend failures otherwise.
    pub async fn clear_active_history(&self) -> Result<()> {
        let Some(session_id) = self.session_id().await else {
            return Err(AdvisorError::internal("no active session to clear"));
        };

        self.api.clear_chat_history(&session_id).await?;

        let mut state = self.state.lock().await;
        if state.session_id.as_deref() == Some(session_id.as_str()) {
            state.messages.clear();
        }
        tracing::info!("[Chat] Cleared history of session {}", session_id);
        Ok(())
    }
}
