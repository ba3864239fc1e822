//! Google leg: `/login/success?token=...`.

use super::{CallbackGuard, CallbackOutcome, CallbackStatus, FALLBACK_DELAY, query_param, strip_params};
use advisor_core::AdvisorError;
use advisor_core::api::AdvisorApi;
use advisor_core::auth::{Credential, LinkState, TokenStore};
use advisor_core::navigation::{NavigationIntent, Route};
use std::sync::Arc;
use url::Url;

const TOKEN_PARAM: &str = "token";

/// Stores the credential issued by the backend and starts the HubSpot leg.
pub struct LoginSuccessHandler {
    api: Arc<dyn AdvisorApi>,
    tokens: Arc<TokenStore>,
    guard: CallbackGuard,
}

impl LoginSuccessHandler {
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
            tracing::debug!("[OAuth] Login success callback already processed");
            return None;
        }

        let Some(token) = query_param(location, TOKEN_PARAM) else {
            tracing::warn!("[OAuth] Login success callback without token");
            return Some(CallbackOutcome {
                status: self.guard.finish(CallbackStatus::Error),
                link_state: LinkState::Unauthenticated,
                notice: "Login failed: no credential was issued.".to_string(),
                navigation: vec![NavigationIntent::Navigate(Route::LoginError)],
            });
        };

        // The token must leave the visible location before anything else.
        let mut navigation = vec![NavigationIntent::ReplaceLocation(strip_params(
            location,
            &[TOKEN_PARAM],
        ))];

        self.tokens.set(Some(Credential::new(token)));
        tracing::info!("[OAuth] Google linked, requesting HubSpot authorization URL");

        let auth_url = self.api.hubspot_auth_url().await.and_then(|raw| {
            Url::parse(&raw)
                .map_err(|e| AdvisorError::link("HubSpot", format!("invalid authorization URL: {}", e)))
        });

        match auth_url {
            Ok(auth_url) => {
                navigation.push(NavigationIntent::Redirect(auth_url));
                Some(CallbackOutcome {
                    status: self.guard.finish(CallbackStatus::Success),
                    link_state: LinkState::GoogleLinked,
                    notice: "Google account connected. Redirecting to HubSpot...".to_string(),
                    navigation,
                })
            }
            Err(e) => {
                tracing::warn!("[OAuth] Could not start HubSpot authorization: {}", e);
                navigation.push(NavigationIntent::CompleteLoginAfter {
                    delay: FALLBACK_DELAY,
                    then: Route::Chat,
                });
                Some(CallbackOutcome {
                    status: self.guard.finish(CallbackStatus::Error),
                    link_state: LinkState::HubSpotLinkFailed,
                    notice: "HubSpot connection failed, but you can proceed without it."
                        .to_string(),
                    navigation,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    fn setup(api: impl FnOnce(MockApi) -> MockApi) -> (LoginSuccessHandler, Arc<MockApi>) {
        let tokens = Arc::new(TokenStore::in_memory());
        let mock = Arc::new(api(MockApi::new(tokens.clone())));
        (LoginSuccessHandler::new(mock.clone(), tokens), mock)
    }

    fn location(s: &str) -> Url {
        Url::parse(&format!("http://localhost{}", s)).unwrap()
    }

    #[tokio::test]
    async fn test_token_is_stored_and_user_sent_to_hubspot() {
        let (handler, mock) = setup(|m| m);

        let outcome = handler
            .handle(&location("/login/success?token=T"))
            .await
            .unwrap();

        assert_eq!(outcome.status, CallbackStatus::Success);
        assert_eq!(outcome.link_state, LinkState::GoogleLinked);
        assert_eq!(
            outcome.navigation[0],
            NavigationIntent::ReplaceLocation("/login/success".to_string())
        );
        assert!(matches!(
            &outcome.navigation[1],
            NavigationIntent::Redirect(url) if url.host_str() == Some("app.hubspot.com")
        ));
        assert_eq!(mock.tokens.get(), Some(Credential::new("T")));
    }

    #[tokio::test]
    async fn test_second_visit_is_a_no_op() {
        let (handler, mock) = setup(|m| m);
        let visit = location("/login/success?token=T");

        assert!(handler.handle(&visit).await.is_some());
        assert!(handler.handle(&visit).await.is_none());

        assert_eq!(mock.tokens.get(), Some(Credential::new("T")));
        assert_eq!(mock.count("hubspot_auth_url"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_visits_run_once() {
        let (handler, mock) = setup(|m| m);
        let visit = location("/login/success?token=T");

        let (a, b) = tokio::join!(handler.handle(&visit), handler.handle(&visit));

        assert_eq!(a.is_some() as u8 + b.is_some() as u8, 1);
        assert_eq!(mock.count("hubspot_auth_url"), 1);
    }

    #[tokio::test]
    async fn test_missing_token_goes_to_error_view() {
        let (handler, mock) = setup(|m| m);

        let outcome = handler.handle(&location("/login/success")).await.unwrap();

        assert_eq!(outcome.status, CallbackStatus::Error);
        assert_eq!(
            outcome.navigation,
            vec![NavigationIntent::Navigate(Route::LoginError)]
        );
        assert!(mock.calls().is_empty());
        assert!(!mock.tokens.has_credential());
    }

    #[tokio::test]
    async fn test_hubspot_failure_falls_back_to_chat() {
        let (handler, _) = setup(|m| m.with_hubspot_url(Err(AdvisorError::transport("down"))));

        let outcome = handler
            .handle(&location("/login/success?token=T"))
            .await
            .unwrap();

        assert_eq!(outcome.status, CallbackStatus::Error);
        assert_eq!(outcome.link_state, LinkState::HubSpotLinkFailed);
        assert_eq!(
            outcome.navigation.last(),
            Some(&NavigationIntent::CompleteLoginAfter {
                delay: FALLBACK_DELAY,
                then: Route::Chat,
            })
        );
        // The credential is kept: the user is still logged in with Google.
        assert!(handler.tokens.has_credential());
        assert_eq!(handler.status(), CallbackStatus::Error);
    }

    #[tokio::test]
    async fn test_unparsable_auth_url_is_a_failure() {
        let (handler, _) = setup(|m| m.with_hubspot_url(Ok("not a url".to_string())));

        let outcome = handler
            .handle(&location("/login/success?token=T"))
            .await
            .unwrap();

        assert_eq!(outcome.status, CallbackStatus::Error);
    }
}
