//! Client routes and navigation intents.
//!
//! Components never mutate the host environment directly. Anything that
//! would change the visible location is returned as a [`NavigationIntent`]
//! and carried out by whoever hosts the router.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// A client-side route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Root,
    Login,
    /// Google leg landing page: `/login/success?token=...`
    LoginSuccess,
    /// HubSpot leg landing page: `/auth/hubspot/callback?code=...|error=...`
    HubSpotCallback,
    LoginError,
    Chat,
    /// Any path the route table does not know.
    Unknown(String),
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Root,
            "/login" => Route::Login,
            "/login/success" => Route::LoginSuccess,
            "/auth/hubspot/callback" => Route::HubSpotCallback,
            "/login/error" => Route::LoginError,
            "/chat" => Route::Chat,
            other => Route::Unknown(other.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::LoginSuccess => "/login/success",
            Route::HubSpotCallback => "/auth/hubspot/callback",
            Route::LoginError => "/login/error",
            Route::Chat => "/chat",
            Route::Unknown(path) => path,
        }
    }

    /// Routes that only make sense with an authenticated identity.
    pub fn requires_identity(&self) -> bool {
        matches!(self, Route::Chat)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A navigation side effect for the host to perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationIntent {
    /// Rewrite the visible location without navigating (history replace).
    ReplaceLocation(String),
    /// Leave the client for an external page (full redirect).
    Redirect(Url),
    /// Client-side route change.
    Navigate(Route),
    /// After `delay`, refresh the login in place and then go to `then`.
    CompleteLoginAfter { delay: Duration, then: Route },
}
