//! Application layer of the Financial Advisor client.
//!
//! Use cases that coordinate the domain types with an [`AdvisorApi`]
//! implementation:
//!
//! - `auth`: [`AuthSession`], the authentication state machine
//! - `oauth`: handlers for the two OAuth callback legs
//! - `chat`: [`ChatSessionManager`], the active conversation and its threads
//! - `router`: the route table and [`ViewController`]
//!
//! [`AdvisorApi`]: advisor_core::api::AdvisorApi

pub mod auth;
pub mod chat;
pub mod oauth;
pub mod router;

#[cfg(test)]
mod testing;

pub use auth::{AuthSession, AuthState, LoginCompletion};
pub use chat::{ChatSessionManager, ChatSnapshot};
pub use oauth::{CallbackOutcome, CallbackStatus, HubSpotCallbackHandler, LoginSuccessHandler};
pub use router::{NavigationReport, View, ViewController};
