//! Auth/session state machine.
//!
//! Owns the answer to "who is logged in". The state starts as `Loading`,
//! settles on `Authenticated` or `Unauthenticated` after [`AuthSession::start`],
//! and is published on a watch channel so the router can re-resolve views
//! whenever it changes.

use advisor_core::api::AdvisorApi;
use advisor_core::auth::{Credential, CredentialState, Identity, LinkState, TokenStore};
use std::sync::Arc;
use tokio::sync::watch;

/// Current authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The initial identity check has not finished.
    Loading,
    Authenticated(Identity),
    Unauthenticated,
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}

/// The ways a login can be completed.
#[derive(Debug, Clone)]
pub enum LoginCompletion {
    /// A fresh credential; the identity is fetched from the backend.
    Credential(Credential),
    /// A credential together with an identity the caller already holds.
    /// No request is made.
    WithIdentity(Credential, Identity),
    /// Re-fetch the identity for the credential already stored, e.g. after
    /// an OAuth callback linked another account.
    Refresh,
}

/// Orchestrates the login chain and exposes the resulting identity.
pub struct AuthSession {
    api: Arc<dyn AdvisorApi>,
    tokens: Arc<TokenStore>,
    state_tx: watch::Sender<AuthState>,
}

impl AuthSession {
    pub fn new(api: Arc<dyn AdvisorApi>, tokens: Arc<TokenStore>) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Loading);
        Self {
            api,
            tokens,
            state_tx,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state_tx.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state_tx.borrow().is_authenticated()
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Resolves the initial state from whatever credential is stored.
    ///
    /// Without a credential no request is made. A failed identity fetch
    /// leaves the credential in place; clearing it is the gateway's call.
    pub async fn start(&self) -> AuthState {
        if !self.tokens.has_credential() {
            tracing::info!("[Auth] No stored credential");
            return self.transition(AuthState::Unauthenticated);
        }

        match self.api.fetch_identity().await {
            Ok(identity) => {
                tracing::info!("[Auth] Restored session for {}", identity.display_name);
                self.transition(AuthState::Authenticated(identity))
            }
            Err(e) => {
                tracing::warn!("[Auth] Identity check failed: {}", e);
                self.transition(AuthState::Unauthenticated)
            }
        }
    }

    /// Completes a login and returns the resulting state.
    pub async fn complete_login(&self, completion: LoginCompletion) -> AuthState {
        match completion {
            LoginCompletion::WithIdentity(credential, identity) => {
                self.tokens.set(Some(credential));
                tracing::info!("[Auth] Logged in as {}", identity.display_name);
                self.transition(AuthState::Authenticated(identity))
            }
            LoginCompletion::Credential(credential) => {
                self.tokens.set(Some(credential));
                match self.api.fetch_identity().await {
                    Ok(identity) => {
                        tracing::info!("[Auth] Logged in as {}", identity.display_name);
                        self.transition(AuthState::Authenticated(identity))
                    }
                    Err(e) => {
                        tracing::warn!("[Auth] Login failed: {}", e);
                        self.transition(AuthState::Unauthenticated)
                    }
                }
            }
            LoginCompletion::Refresh => self.refresh().await,
        }
    }

    async fn refresh(&self) -> AuthState {
        match self.api.fetch_identity().await {
            Ok(identity) => {
                tracing::debug!("[Auth] Identity refreshed");
                self.transition(AuthState::Authenticated(identity))
            }
            Err(e) if e.is_auth_failure() => {
                tracing::info!("[Auth] Refresh rejected: {}", e);
                self.transition(AuthState::Unauthenticated)
            }
            Err(e) => {
                // Transport trouble: keep what we had, unless we never got anywhere.
                tracing::warn!("[Auth] Refresh failed, keeping previous state: {}", e);
                let current = self.state();
                if current.is_loading() {
                    self.transition(AuthState::Unauthenticated)
                } else {
                    current
                }
            }
        }
    }

    /// Logs out. Always ends `Unauthenticated`, whatever the backend says.
    pub async fn logout(&self) -> AuthState {
        self.api.logout().await;
        self.tokens.set(None);
        tracing::info!("[Auth] Logged out");
        self.transition(AuthState::Unauthenticated)
    }

    /// Reacts to a credential change made elsewhere (e.g. a 401 seen by the
    /// gateway).
    pub fn observe_credential(&self, credential: CredentialState) -> AuthState {
        match credential {
            CredentialState::Present => self.state(),
            CredentialState::Absent | CredentialState::Expired => {
                let current = self.state();
                if matches!(current, AuthState::Unauthenticated) {
                    return current;
                }
                tracing::info!("[Auth] Credential {:?}, signing out", credential);
                self.transition(AuthState::Unauthenticated)
            }
        }
    }

    /// Link state derived from the current identity.
    pub fn link_state(&self) -> LinkState {
        LinkState::derive(self.state_tx.borrow().identity(), false)
    }

    /// Replaces the ongoing instructions of the held identity after a
    /// successful update.
    pub fn set_ongoing_instructions(&self, instructions: &str) {
        self.state_tx.send_if_modified(|state| match state {
            AuthState::Authenticated(identity) if identity.ongoing_instructions != instructions => {
                identity.ongoing_instructions = instructions.to_string();
                true
            }
            _ => false,
        });
    }

    fn transition(&self, next: AuthState) -> AuthState {
        self.state_tx.send_replace(next.clone());
        next
    }
}
