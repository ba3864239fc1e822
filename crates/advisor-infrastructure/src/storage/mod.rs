//! Storage layer for atomic file operations and the credential slot.

mod atomic_toml;
mod session_slot;

pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
pub use session_slot::FileSlot;
