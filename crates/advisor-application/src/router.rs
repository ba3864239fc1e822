//! Router and view controller.
//!
//! [`resolve`] is the route table: a pure function of the route and the
//! auth state. [`ViewController`] drives it: it keeps the visible location,
//! mounts the OAuth callback handlers, performs the navigation intents they
//! return and follows the credential state published by the token store.

use crate::auth::{AuthSession, AuthState, LoginCompletion};
use crate::chat::ChatSessionManager;
use crate::oauth::{CallbackOutcome, HubSpotCallbackHandler, LoginSuccessHandler};
use advisor_core::api::AdvisorApi;
use advisor_core::auth::{CredentialState, TokenStore};
use advisor_core::config::ClientConfig;
use advisor_core::navigation::{NavigationIntent, Route};
use advisor_core::{AdvisorError, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use url::Url;

/// Origin used to interpret path-only locations.
const LOCAL_ORIGIN: &str = "http://localhost";

/// Upper bound on redirects followed by one navigation.
const MAX_HOPS: usize = 8;

/// The view mounted for the current location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// The initial auth check is still running.
    Loading,
    /// Login page; the button leads to `google_login_url`.
    Login { google_login_url: Url },
    LoginSuccess,
    HubSpotCallback,
    Chat,
    ErrorView,
}

/// What a route resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(ViewKind),
    Redirect(Route),
}

/// A view without its per-instance data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Loading,
    Login,
    LoginSuccess,
    HubSpotCallback,
    Chat,
    ErrorView,
}

/// The route table.
pub fn resolve(route: &Route, auth: &AuthState) -> Resolution {
    let authenticated = match auth {
        AuthState::Loading => return Resolution::Render(ViewKind::Loading),
        AuthState::Authenticated(_) => true,
        AuthState::Unauthenticated => false,
    };

    match route {
        Route::Login if authenticated => Resolution::Redirect(Route::Chat),
        Route::Login => Resolution::Render(ViewKind::Login),
        Route::LoginSuccess => Resolution::Render(ViewKind::LoginSuccess),
        Route::HubSpotCallback => Resolution::Render(ViewKind::HubSpotCallback),
        Route::LoginError => Resolution::Render(ViewKind::ErrorView),
        Route::Chat if authenticated => Resolution::Render(ViewKind::Chat),
        Route::Chat => Resolution::Redirect(Route::Login),
        Route::Root | Route::Unknown(_) if authenticated => Resolution::Redirect(Route::Chat),
        Route::Root | Route::Unknown(_) => Resolution::Redirect(Route::Login),
    }
}

/// Parses a location given as a full URL or as a path with optional query.
pub fn parse_location(location: &str) -> Result<Url> {
    let base = Url::parse(LOCAL_ORIGIN)?;
    Ok(base.join(location.trim())?)
}

fn visible(location: &Url) -> String {
    match location.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", location.path(), query),
        _ => location.path().to_string(),
    }
}

/// What one navigation ended on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationReport {
    pub view: View,
    /// Visible location after all rewrites.
    pub location: String,
    /// Outcomes of the callback handlers that ran, in order.
    pub callbacks: Vec<CallbackOutcome>,
    /// Set when the client was sent to an external page. Nothing after the
    /// redirect was performed.
    pub external_redirect: Option<Url>,
}

impl NavigationReport {
    fn new(view: View, location: String) -> Self {
        Self {
            view,
            location,
            callbacks: Vec::new(),
            external_redirect: None,
        }
    }
}

/// Handler mounted for one callback visit.
#[derive(Clone)]
enum Mounted {
    LoginSuccess(Url, Arc<LoginSuccessHandler>),
    HubSpotCallback(Url, Arc<HubSpotCallbackHandler>),
}

impl Mounted {
    fn visit(&self) -> &Url {
        match self {
            Mounted::LoginSuccess(visit, _) | Mounted::HubSpotCallback(visit, _) => visit,
        }
    }
}

/// Where the client goes after performing intents.
enum Next {
    Open(Url),
    Leave(Url),
    Stay,
}

struct ControllerState {
    location: String,
    view: View,
    mounted: Option<Mounted>,
}

/// Hosts the views headlessly.
pub struct ViewController {
    api: Arc<dyn AdvisorApi>,
    tokens: Arc<TokenStore>,
    auth: Arc<AuthSession>,
    chat: Arc<ChatSessionManager>,
    google_login_url: Url,
    state: Mutex<ControllerState>,
}

impl ViewController {
    /// # Errors
    ///
    /// `Config` if the Google entry point cannot be derived from `config`.
    pub fn new(
        config: &ClientConfig,
        api: Arc<dyn AdvisorApi>,
        tokens: Arc<TokenStore>,
        auth: Arc<AuthSession>,
        chat: Arc<ChatSessionManager>,
    ) -> Result<Self> {
        Ok(Self {
            google_login_url: config.google_login_url()?,
            api,
            tokens,
            auth,
            chat,
            state: Mutex::new(ControllerState {
                location: Route::Root.path().to_string(),
                view: View::Loading,
                mounted: None,
            }),
        })
    }

    pub fn auth(&self) -> &Arc<AuthSession> {
        &self.auth
    }

    pub fn chat(&self) -> &Arc<ChatSessionManager> {
        &self.chat
    }

    pub fn view(&self) -> View {
        self.lock().view.clone()
    }

    pub fn location(&self) -> String {
        self.lock().location.clone()
    }

    /// Runs the initial auth check and then opens `location`.
    pub async fn start(&self, location: &str) -> Result<NavigationReport> {
        self.auth.start().await;
        self.navigate(location).await
    }

    /// Opens `location`, following redirects and callback intents until a
    /// view settles or the client leaves for an external page.
    pub async fn navigate(&self, location: &str) -> Result<NavigationReport> {
        let mut target = parse_location(location)?;
        let mut callbacks = Vec::new();

        for _ in 0..MAX_HOPS {
            let route = Route::from_path(target.path());
            let kind = match resolve(&route, &self.auth.state()) {
                Resolution::Redirect(next) => {
                    tracing::debug!("[Router] {} redirects to {}", route, next);
                    target = parse_location(next.path())?;
                    continue;
                }
                Resolution::Render(kind) => kind,
            };

            let (view, mounted) = self.mount(kind, &target);
            tracing::debug!("[Router] {} renders {:?}", route, kind);

            let handler_outcome = match mounted {
                Some(Mounted::LoginSuccess(_, handler)) => handler.handle(&target).await,
                Some(Mounted::HubSpotCallback(_, handler)) => handler.handle(&target).await,
                None => None,
            };

            if kind == ViewKind::Chat {
                self.enter_chat().await;
            }

            let Some(outcome) = handler_outcome else {
                return Ok(NavigationReport {
                    callbacks,
                    ..NavigationReport::new(view, self.location())
                });
            };

            let intents = outcome.navigation.clone();
            callbacks.push(outcome);

            match self.perform(intents).await {
                Next::Open(next) => target = next,
                Next::Stay => {
                    return Ok(NavigationReport {
                        callbacks,
                        ..NavigationReport::new(view, self.location())
                    });
                }
                Next::Leave(url) => {
                    return Ok(NavigationReport {
                        callbacks,
                        external_redirect: Some(url),
                        ..NavigationReport::new(view, self.location())
                    });
                }
            }
        }

        Err(AdvisorError::internal(format!(
            "too many redirects while opening {}",
            location
        )))
    }

    /// Reacts to a credential change. When the credential is gone and the
    /// current view needs an identity, the controller moves to Login.
    pub async fn on_credential_change(
        &self,
        credential: CredentialState,
    ) -> Result<Option<NavigationReport>> {
        let state = self.auth.observe_credential(credential);
        if state.is_authenticated() {
            return Ok(None);
        }

        let on_protected_view = Route::from_path(&self.location()).requires_identity()
            || self.view() == View::Chat;
        if !on_protected_view {
            return Ok(None);
        }

        tracing::info!("[Router] Credential {:?}, returning to login", credential);
        self.navigate(Route::Login.path()).await.map(Some)
    }

    /// Follows the token store for the lifetime of the controller.
    pub fn spawn_credential_watch(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut rx = self.tokens.subscribe();

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let credential = *rx.borrow_and_update();
                if let Err(e) = controller.on_credential_change(credential).await {
                    tracing::error!("[Router] Failed to react to credential change: {}", e);
                }
            }
        })
    }

    /// Performs intents in order, stopping at the first one that moves
    /// the client somewhere else.
    async fn perform(&self, intents: Vec<NavigationIntent>) -> Next {
        for intent in intents {
            match intent {
                NavigationIntent::ReplaceLocation(location) => {
                    self.lock().location = location;
                }
                NavigationIntent::Redirect(url) => {
                    tracing::info!("[Router] Leaving for {}", url.origin().ascii_serialization());
                    return Next::Leave(url);
                }
                NavigationIntent::Navigate(route) => {
                    return Self::open(&route);
                }
                NavigationIntent::CompleteLoginAfter { delay, then } => {
                    tokio::time::sleep(delay).await;
                    self.auth.complete_login(LoginCompletion::Refresh).await;
                    return Self::open(&then);
                }
            }
        }
        Next::Stay
    }

    fn open(route: &Route) -> Next {
        match parse_location(route.path()) {
            Ok(url) => Next::Open(url),
            Err(e) => {
                tracing::error!("[Router] Cannot open {}: {}", route, e);
                Next::Stay
            }
        }
    }

    /// Records the view for `kind` and mounts (or reuses) its handler.
    ///
    /// # Returns
    ///
    /// The view and the handler for this visit, taken under the same lock
    /// so a concurrent navigation cannot swap the handler in between.
    fn mount(&self, kind: ViewKind, target: &Url) -> (View, Option<Mounted>) {
        let view = match kind {
            ViewKind::Loading => View::Loading,
            ViewKind::Login => View::Login {
                google_login_url: self.google_login_url.clone(),
            },
            ViewKind::LoginSuccess => View::LoginSuccess,
            ViewKind::HubSpotCallback => View::HubSpotCallback,
            ViewKind::Chat => View::Chat,
            ViewKind::ErrorView => View::ErrorView,
        };

        let mut state = self.lock();
        state.view = view.clone();

        // Re-entering the same visit keeps the handler and the rewritten location.
        let reuse = state
            .mounted
            .as_ref()
            .is_some_and(|mounted| mounted.visit() == target);
        if !reuse {
            state.location = visible(target);
            state.mounted = match kind {
                ViewKind::LoginSuccess => Some(Mounted::LoginSuccess(
                    target.clone(),
                    Arc::new(LoginSuccessHandler::new(self.api.clone(), self.tokens.clone())),
                )),
                ViewKind::HubSpotCallback => Some(Mounted::HubSpotCallback(
                    target.clone(),
                    Arc::new(HubSpotCallbackHandler::new(self.api.clone(), self.tokens.clone())),
                )),
                _ => None,
            };
        }
        (view, state.mounted.clone())
    }

    /// Loads what the chat view shows on entry.
    async fn enter_chat(&self) {
        if let Some(identity) = self.auth.identity() {
            self.chat.load_ongoing_instructions(&identity).await;
        }
        self.chat.refresh_sessions().await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
