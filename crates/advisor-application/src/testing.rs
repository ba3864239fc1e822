//! Test double for [`AdvisorApi`] shared by the use case tests.

use advisor_core::api::{AdvisorApi, ChatReply, HealthStatus};
use advisor_core::auth::{Identity, TokenStore};
use advisor_core::session::{ChatMessage, ChatSessionSummary};
use advisor_core::{AdvisorError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted reply for one chat message text.
#[derive(Clone)]
pub struct ScriptedReply {
    pub delay: Duration,
    pub result: Result<String>,
}

/// Mock backend that mirrors the gateway's credential rules: calls without a
/// credential never count as requests, and `SessionExpired` expires the
/// shared token store.
pub struct MockApi {
    pub tokens: Arc<TokenStore>,
    identity: Mutex<Result<Identity>>,
    hubspot_url: Mutex<Result<String>>,
    hubspot_submit: Mutex<Result<()>>,
    instructions: Mutex<Result<()>>,
    replies: Mutex<HashMap<String, ScriptedReply>>,
    sessions: Mutex<Vec<ChatSessionSummary>>,
    history: Mutex<HashMap<String, Vec<ChatMessage>>>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        Self {
            tokens,
            identity: Mutex::new(Ok(Identity::new("Ada").with_integrations(true, false))),
            hubspot_url: Mutex::new(Ok("https://app.hubspot.com/oauth/authorize?client_id=x".into())),
            hubspot_submit: Mutex::new(Ok(())),
            instructions: Mutex::new(Ok(())),
            replies: Mutex::new(HashMap::new()),
            sessions: Mutex::new(Vec::new()),
            history: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_identity(self, identity: Result<Identity>) -> Self {
        *self.identity.lock().unwrap() = identity;
        self
    }

    pub fn with_hubspot_url(self, url: Result<String>) -> Self {
        *self.hubspot_url.lock().unwrap() = url;
        self
    }

    pub fn with_hubspot_submit(self, result: Result<()>) -> Self {
        *self.hubspot_submit.lock().unwrap() = result;
        self
    }

    pub fn with_instructions_result(self, result: Result<()>) -> Self {
        *self.instructions.lock().unwrap() = result;
        self
    }

    pub fn with_reply(self, text: &str, delay_ms: u64, result: Result<String>) -> Self {
        self.replies.lock().unwrap().insert(
            text.to_string(),
            ScriptedReply {
                delay: Duration::from_millis(delay_ms),
                result,
            },
        );
        self
    }

    pub fn with_sessions(self, sessions: Vec<ChatSessionSummary>) -> Self {
        *self.sessions.lock().unwrap() = sessions;
        self
    }

    pub fn with_history(self, session_id: &str, messages: Vec<ChatMessage>) -> Self {
        self.history
            .lock()
            .unwrap()
            .insert(session_id.to_string(), messages);
        self
    }

    /// Requests that reached the "network", in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }

    fn request(&self, call: &str) -> Result<()> {
        if !self.tokens.has_credential() {
            return Err(AdvisorError::Unauthenticated);
        }
        self.calls.lock().unwrap().push(call.to_string());
        Ok(())
    }

    fn settle<T>(&self, result: Result<T>) -> Result<T> {
        if matches!(result, Err(AdvisorError::SessionExpired)) {
            self.tokens.expire();
        }
        result
    }
}

#[async_trait]
impl AdvisorApi for MockApi {
    async fn fetch_identity(&self) -> Result<Identity> {
        self.request("fetch_identity")?;
        let result = self.identity.lock().unwrap().clone();
        self.settle(result)
    }

    async fn send_chat_message(&self, text: &str, _session_id: &str) -> Result<ChatReply> {
        self.request("send_chat_message")?;
        let scripted = self.replies.lock().unwrap().get(text).cloned();
        let scripted = scripted.unwrap_or(ScriptedReply {
            delay: Duration::ZERO,
            result: Ok("Hi there".to_string()),
        });
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        self.settle(scripted.result).map(ChatReply::new)
    }

    async fn list_chat_sessions(&self) -> Vec<ChatSessionSummary> {
        if self.request("list_chat_sessions").is_err() {
            return Vec::new();
        }
        self.sessions.lock().unwrap().clone()
    }

    async fn fetch_chat_history(&self, session_id: &str) -> Vec<ChatMessage> {
        if self.request("fetch_chat_history").is_err() {
            return Vec::new();
        }
        self.history
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn update_ongoing_instructions(&self, _text: &str) -> Result<()> {
        self.request("update_ongoing_instructions")?;
        let result = self.instructions.lock().unwrap().clone();
        self.settle(result)
    }

    async fn logout(&self) {
        let _ = self.request("logout");
        self.tokens.set(None);
    }

    async fn hubspot_auth_url(&self) -> Result<String> {
        self.request("hubspot_auth_url")?;
        let result = self.hubspot_url.lock().unwrap().clone();
        self.settle(result)
    }

    async fn submit_hubspot_code(&self, _code: &str) -> Result<()> {
        self.request("submit_hubspot_code")?;
        let result = self.hubspot_submit.lock().unwrap().clone();
        self.settle(result)
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::down()
    }

    async fn clear_chat_history(&self, session_id: &str) -> Result<()> {
        self.request("clear_chat_history")?;
        self.history.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn test_email_webhook(&self, payload: serde_json::Value) -> Result<serde_json::Value> {
        self.request("test_email_webhook")?;
        Ok(payload)
    }
}
