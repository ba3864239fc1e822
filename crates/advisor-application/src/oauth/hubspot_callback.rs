//! HubSpot leg: `/auth/hubspot/callback?code=...|error=...`.

use super::{
    CallbackGuard, CallbackOutcome, CallbackStatus, FALLBACK_DELAY, HUBSPOT_SUCCESS_DELAY,
    query_param, strip_params,
};
use advisor_core::api::AdvisorApi;
use advisor_core::auth::{LinkState, TokenStore};
use advisor_core::navigation::{NavigationIntent, Route};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const CALLBACK_PARAMS: [&str; 3] = ["code", "error", "state"];

/// Hands the HubSpot authorization code to the backend.
///
/// Every path ends in the chat view: a failed link only means HubSpot
/// features stay unavailable.
pub struct HubSpotCallbackHandler {
    api: Arc<dyn AdvisorApi>,
    tokens: Arc<TokenStore>,
    guard: CallbackGuard,
}

impl HubSpotCallbackHandler {
    pub fn new(api: Arc<dyn AdvisorApi>, tokens: Arc<TokenStore>) -> Self {
        Self {
            api,
            tokens,
            guard: CallbackGuard::new(),
        }
    }

    pub fn status(&self) -> CallbackStatus {
        self.guard.status()
    }

    /// Processes the callback location.
    ///
    /// # Returns
    ///
    /// `None` if this handler already ran; the visit is a no-op.
    pub async fn handle(&self, location: &Url) -> Option<CallbackOutcome> {
        if !self.guard.claim() {
            tracing::debug!("[OAuth] HubSpot callback already processed");
            return None;
        }

        let code = query_param(location, "code");
        let error = query_param(location, "error");
        let visible = NavigationIntent::ReplaceLocation(strip_params(location, &CALLBACK_PARAMS));

        if let Some(error) = error {
            tracing::warn!("[OAuth] HubSpot authorization denied: {}", error);
            return Some(self.failed(visible, LinkState::HubSpotLinkFailed));
        }

        let Some(code) = code else {
            tracing::warn!("[OAuth] HubSpot callback without code or error");
            return Some(self.failed(visible, LinkState::HubSpotLinkFailed));
        };

        if !self.tokens.has_credential() {
            tracing::warn!("[OAuth] HubSpot callback without a stored credential");
            return Some(self.failed(visible, LinkState::Unauthenticated));
        }

        match self.api.submit_hubspot_code(&code).await {
            Ok(()) => {
                tracing::info!("[OAuth] HubSpot linked");
                Some(self.finished(
                    CallbackStatus::Success,
                    LinkState::GoogleAndHubSpotLinked,
                    "HubSpot connected successfully! Redirecting to your dashboard...",
                    visible,
                    HUBSPOT_SUCCESS_DELAY,
                ))
            }
            Err(e) => {
                tracing::warn!("[OAuth] HubSpot link failed: {}", e);
                let link_state = if e.is_auth_failure() {
                    LinkState::Unauthenticated
                } else {
                    LinkState::HubSpotLinkFailed
                };
                Some(self.failed(visible, link_state))
            }
        }
    }

    fn failed(&self, visible: NavigationIntent, link_state: LinkState) -> CallbackOutcome {
        self.finished(
            CallbackStatus::Error,
            link_state,
            "HubSpot connection failed, but you can connect it later.",
            visible,
            FALLBACK_DELAY,
        )
    }

    fn finished(
        &self,
        status: CallbackStatus,
        link_state: LinkState,
        notice: &str,
        visible: NavigationIntent,
        delay: Duration,
    ) -> CallbackOutcome {
        CallbackOutcome {
            status: self.guard.finish(status),
            link_state,
            notice: notice.to_string(),
            navigation: vec![
                visible,
                NavigationIntent::CompleteLoginAfter {
                    delay,
                    then: Route::Chat,
                },
            ],
        }
    }
}
