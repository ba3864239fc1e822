//! Authentication domain module.
//!
//! # Module Structure
//!
//! - `credential`: Opaque bearer credential (`Credential`)
//! - `identity`: Authenticated user profile and link state (`Identity`, `LinkState`)
//! - `token_store`: Credential holder backed by a session slot (`TokenStore`)
//!
//! # Usage
//!
//! ```ignore
//! use advisor_core::auth::{Credential, Identity, LinkState, TokenStore};
//! ```

mod credential;
mod identity;
mod token_store;

pub use credential::Credential;
pub use identity::{Identity, IntegrationFlags, LinkState};
pub use token_store::{
    CREDENTIAL_SLOT_KEY, CredentialState, MemorySlot, SessionSlot, TokenStore,
};
