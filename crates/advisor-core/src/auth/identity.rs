//! Authenticated user identity and the derived integration link state.

use serde::{Deserialize, Serialize};

/// Which third-party integrations the backend holds tokens for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationFlags {
    pub google_linked: bool,
    pub hubspot_linked: bool,
}

/// The authenticated user's profile as reported by `GET /auth/user`.
///
/// Held in memory only; it is re-derived from the credential after every
/// reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend user id, when the backend reports one.
    pub id: Option<i64>,
    pub email: Option<String>,
    pub display_name: String,
    pub integrations: IntegrationFlags,
    /// Standing instructions the assistant applies to every conversation.
    pub ongoing_instructions: String,
}

impl Identity {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    pub fn with_integrations(mut self, google_linked: bool, hubspot_linked: bool) -> Self {
        self.integrations = IntegrationFlags {
            google_linked,
            hubspot_linked,
        };
        self
    }

    pub fn link_state(&self) -> LinkState {
        LinkState::derive(Some(self), false)
    }
}

/// Derived status of the OAuth linking chain. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Unauthenticated,
    GoogleLinked,
    GoogleAndHubSpotLinked,
    /// The Google leg succeeded but the HubSpot leg did not.
    HubSpotLinkFailed,
}

impl LinkState {
    /// Computes the link state from the current identity.
    ///
    /// `hubspot_leg_failed` is only known transiently while a callback is
    /// being processed; once the page reloads the flags are authoritative.
    pub fn derive(identity: Option<&Identity>, hubspot_leg_failed: bool) -> Self {
        match identity {
            None => LinkState::Unauthenticated,
            Some(identity) if identity.integrations.hubspot_linked => {
                LinkState::GoogleAndHubSpotLinked
            }
            Some(_) if hubspot_leg_failed => LinkState::HubSpotLinkFailed,
            Some(_) => LinkState::GoogleLinked,
        }
    }

    /// True when HubSpot-backed features (contacts, CRM notes) are usable.
    pub fn has_crm(&self) -> bool {
        matches!(self, LinkState::GoogleAndHubSpotLinked)
    }
}
