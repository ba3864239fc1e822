//! OAuth linking chain.
//!
//! Login is a two-leg chain: the backend finishes Google OAuth and redirects
//! to `/login/success?token=...`, the client then sends the user to HubSpot,
//! and HubSpot redirects back to `/auth/hubspot/callback?code=...`.
//!
//! Module structure:
//! - `login_success`: [`LoginSuccessHandler`] for the Google leg
//! - `hubspot_callback`: [`HubSpotCallbackHandler`] for the HubSpot leg
//!
//! Both handlers run at most once per instance and never navigate on their
//! own; they return the [`NavigationIntent`]s for the host to carry out.

mod hubspot_callback;
mod login_success;

pub use hubspot_callback::HubSpotCallbackHandler;
pub use login_success::LoginSuccessHandler;

use advisor_core::auth::LinkState;
use advisor_core::navigation::NavigationIntent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Delay before falling back to the chat view after a failed leg.
pub const FALLBACK_DELAY: Duration = Duration::from_millis(2000);

/// Delay before entering the chat view after HubSpot linked successfully.
pub const HUBSPOT_SUCCESS_DELAY: Duration = Duration::from_millis(1500);

/// Progress of a callback. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Processing,
    Success,
    Error,
}

impl CallbackStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallbackStatus::Processing)
    }
}

/// Result of handling one callback visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub status: CallbackStatus,
    pub link_state: LinkState,
    /// Human-readable status line for the host to display.
    pub notice: String,
    /// Side effects to perform, in order.
    pub navigation: Vec<NavigationIntent>,
}

/// Run-once guard plus status cell shared by both handlers.
#[derive(Debug)]
pub(crate) struct CallbackGuard {
    fired: AtomicBool,
    status: Mutex<CallbackStatus>,
}

impl CallbackGuard {
    pub(crate) fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
            status: Mutex::new(CallbackStatus::Processing),
        }
    }

    /// Claims the single run. Only the first caller gets `true`.
    pub(crate) fn claim(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn status(&self) -> CallbackStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves out of `Processing`. A terminal status is kept as is.
    pub(crate) fn finish(&self, next: CallbackStatus) -> CallbackStatus {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if !status.is_terminal() {
            *status = next;
        }
        *status
    }
}

/// Returns the first value of query parameter `key`, if non-empty.
pub(crate) fn query_param(location: &Url, key: &str) -> Option<String> {
    location
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// The visible location (path and query) with the given parameters removed.
pub(crate) fn strip_params(location: &Url, keys: &[&str]) -> String {
    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(k, _)| !keys.iter().any(|key| k == key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        return location.path().to_string();
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(kept)
        .finish();
    format!("{}?{}", location.path(), query)
}
