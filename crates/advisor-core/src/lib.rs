//! Domain layer of the Financial Advisor client.
//!
//! Holds the types every other crate shares: the credential and token
//! store, identity and link state, chat messages and session summaries,
//! routes and navigation intents, configuration, and the [`api::AdvisorApi`]
//! trait that separates the client logic from the HTTP transport.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod navigation;
pub mod session;

// Re-export common error type
pub use error::{AdvisorError, Result};
