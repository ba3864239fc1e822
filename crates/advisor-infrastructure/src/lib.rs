//! Infrastructure layer: filesystem paths, configuration loading and the
//! persisted credential slot.

pub mod config_service;
pub mod paths;
pub mod session_store;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::AdvisorPaths;
pub use crate::session_store::{open_token_store, session_slot};
pub use crate::storage::FileSlot;
