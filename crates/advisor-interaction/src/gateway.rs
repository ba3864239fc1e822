//! ApiGatewayClient - reqwest implementation of [`AdvisorApi`].
//!
//! Every request goes through [`ApiGatewayClient::dispatch`], which attaches
//! the bearer credential held by the shared [`TokenStore`] and handles an
//! authentication rejection uniformly: the store is expired (notifying the
//! router) and the call fails with `SessionExpired`.

use crate::dto::{
    ChatRequest, HistoryEntryDto, HubSpotAuthUrlDto, HubSpotCallbackDto, HubSpotCodeRequest,
    InstructionsRequest, SessionDto, UserDto,
};
use advisor_core::api::{AdvisorApi, ChatReply, HealthStatus};
use advisor_core::auth::{Identity, TokenStore};
use advisor_core::config::ClientConfig;
use advisor_core::session::{ChatMessage, ChatSessionSummary};
use advisor_core::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;

const HUBSPOT: &str = "HubSpot";

/// Message surfaced to the caller when sending a chat message fails.
pub const SEND_FAILED: &str = "Failed to send message";

/// HTTP client for the advisor backend.
#[derive(Clone)]
pub struct ApiGatewayClient {
    client: Client,
    base_url: Url,
    tokens: Arc<TokenStore>,
}

impl ApiGatewayClient {
    /// Creates a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &ClientConfig, tokens: Arc<TokenStore>) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url()?;
        if base_url.cannot_be_a_base() {
            return Err(AdvisorError::config(format!(
                "api_base_url is not a base URL: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AdvisorError::config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!("[Gateway] Initialized with base URL {}", base_url);

        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Fails locally when no credential is held, so the request is never sent.
    fn require_credential(&self, operation: &str) -> Result<()> {
        if self.tokens.has_credential() {
            Ok(())
        } else {
            tracing::debug!("[Gateway] {} skipped: no credential", operation);
            Err(AdvisorError::Unauthenticated)
        }
    }

    /// Sends a request with the bearer credential attached.
    ///
    /// A 401 response expires the token store and yields `SessionExpired`.
    /// Any other status is returned to the caller as is.
    async fn dispatch(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let request = match self.tokens.get() {
            Some(credential) => request.header(AUTHORIZATION, credential.bearer_header()),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, &e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("[Gateway] {} rejected with 401", operation);
            self.tokens.expire();
            return Err(AdvisorError::SessionExpired);
        }

        Ok(response)
    }

    /// Dispatches and decodes a JSON body from a success response.
    async fn dispatch_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = ensure_success(operation, self.dispatch(operation, request).await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AdvisorError::transport(format!("{}: invalid response body: {}", operation, e)))
    }
}

fn transport_error(operation: &str, e: &reqwest::Error) -> AdvisorError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    AdvisorError::transport(format!("{} {}: {}", operation, kind, e))
}

async fn ensure_success(operation: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AdvisorError::transport(format!(
        "{} failed ({}): {}",
        operation, status, body
    )))
}

#[async_trait]
impl AdvisorApi for ApiGatewayClient {
    async fn fetch_identity(&self) -> Result<Identity> {
        self.require_credential("fetch_identity")?;
        let request = self.client.get(self.endpoint(&["auth", "user"]));
        let user: UserDto = self.dispatch_json("fetch_identity", request).await?;
        Ok(user.into())
    }

    async fn send_chat_message(&self, text: &str, session_id: &str) -> Result<ChatReply> {
        self.require_credential("send_chat_message")?;
        let request = self
            .client
            .post(self.endpoint(&["api", "chat", "message"]))
            .json(&ChatRequest {
                message: text,
                session_id,
            });

        self.dispatch_json("send_chat_message", request)
            .await
            .map_err(|e| {
                tracing::error!("[Gateway] Send message error: {}", e);
                AdvisorError::transport(SEND_FAILED)
            })
    }

    async fn list_chat_sessions(&self) -> Vec<ChatSessionSummary> {
        if self.require_credential("list_chat_sessions").is_err() {
            return Vec::new();
        }
        let request = self.client.get(self.endpoint(&["api", "chat", "sessions"]));

        match self
            .dispatch_json::<Vec<SessionDto>>("list_chat_sessions", request)
            .await
        {
            Ok(sessions) => sessions.into_iter().map(ChatSessionSummary::from).collect(),
            Err(e) => {
                tracing::warn!("[Gateway] {}", AdvisorError::non_fatal_read(e.to_string()));
                Vec::new()
            }
        }
    }

    async fn fetch_chat_history(&self, session_id: &str) -> Vec<ChatMessage> {
        if self.require_credential("fetch_chat_history").is_err() {
            return Vec::new();
        }
        let request = self
            .client
            .get(self.endpoint(&["api", "chat", "history", session_id]));

        match self
            .dispatch_json::<Vec<HistoryEntryDto>>("fetch_chat_history", request)
            .await
        {
            Ok(entries) => entries.into_iter().map(ChatMessage::from).collect(),
            Err(e) => {
                tracing::warn!("[Gateway] {}", AdvisorError::non_fatal_read(e.to_string()));
                Vec::new()
            }
        }
    }

    async fn update_ongoing_instructions(&self, text: &str) -> Result<()> {
        self.require_credential("update_ongoing_instructions")?;
        let request = self
            .client
            .post(self.endpoint(&["api", "chat", "instructions"]))
            .json(&InstructionsRequest { instructions: text });

        let response = self.dispatch("update_ongoing_instructions", request).await?;
        ensure_success("update_ongoing_instructions", response).await?;
        tracing::info!("[Gateway] Ongoing instructions updated");
        Ok(())
    }

    async fn logout(&self) {
        if self.tokens.has_credential() {
            let request = self.client.post(self.endpoint(&["api", "auth", "logout"]));
            let result = match self.dispatch("logout", request).await {
                Ok(response) => ensure_success("logout", response).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!("[Gateway] Logout notification failed: {}", e);
            }
        }
        self.tokens.set(None);
        tracing::info!("[Gateway] Logged out");
    }

    async fn hubspot_auth_url(&self) -> Result<String> {
        self.require_credential("hubspot_auth_url")?;
        let request = self.client.get(self.endpoint(&["api", "auth", "hubspot"]));
        let dto: HubSpotAuthUrlDto = self.dispatch_json("hubspot_auth_url", request).await?;

        dto.auth_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AdvisorError::link(HUBSPOT, "no authorization URL received"))
    }

    async fn submit_hubspot_code(&self, code: &str) -> Result<()> {
        self.require_credential("submit_hubspot_code")?;
        let request = self
            .client
            .post(self.endpoint(&["auth", "hubspot", "callback"]))
            .json(&HubSpotCodeRequest { code });

        // The backend reports link failures as a 4xx with a JSON body.
        let response = self.dispatch("submit_hubspot_code", request).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("submit_hubspot_code", &e))?;

        match serde_json::from_str::<HubSpotCallbackDto>(&body) {
            Ok(dto) if dto.success && status.is_success() => {
                tracing::info!("[Gateway] HubSpot code accepted");
                Ok(())
            }
            Ok(dto) => Err(AdvisorError::link(
                HUBSPOT,
                dto.error
                    .unwrap_or_else(|| "Connection failed. Please try again.".to_string()),
            )),
            Err(_) if !status.is_success() => Err(AdvisorError::link(
                HUBSPOT,
                format!("backend returned {}", status),
            )),
            Err(e) => Err(AdvisorError::transport(format!(
                "submit_hubspot_code: invalid response body: {}",
                e
            ))),
        }
    }

    async fn health_check(&self) -> HealthStatus {
        let request = self.client.get(self.endpoint(&["actuator", "health"]));
        match self.dispatch_json::<HealthStatus>("health_check", request).await {
            Ok(health) => health,
            Err(e) => {
                tracing::warn!("[Gateway] Health check error: {}", e);
                HealthStatus::down()
            }
        }
    }

    async fn clear_chat_history(&self, session_id: &str) -> Result<()> {
        self.require_credential("clear_chat_history")?;
        let request = self
            .client
            .delete(self.endpoint(&["api", "chat", "history", session_id, "clear"]));

        let response = self.dispatch("clear_chat_history", request).await?;
        ensure_success("clear_chat_history", response).await?;
        tracing::info!("[Gateway] Cleared history of session {}", session_id);
        Ok(())
    }

    async fn test_email_webhook(&self, payload: serde_json::Value) -> Result<serde_json::Value> {
        self.require_credential("test_email_webhook")?;
        let request = self
            .client
            .post(self.endpoint(&["api", "webhooks", "test", "email"]))
            .json(&payload);

        let response = self.dispatch("test_email_webhook", request).await?;
        let body = ensure_success("test_email_webhook", response)
            .await?
            .text()
            .await
            .map_err(|e| transport_error("test_email_webhook", &e))?;

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        // Plain-text acknowledgements are returned as a JSON string.
        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
    }
}
