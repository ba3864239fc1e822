//! Token store: the single holder of the bearer credential.
//!
//! The store is constructed once and shared by `Arc` with every component
//! that needs the credential. It mirrors every change into a session-scoped
//! slot so a restarted client within the same session can recover the
//! credential, and it publishes a [`CredentialState`] on a watch channel so
//! the router can react when the credential disappears.

use super::credential::Credential;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Fixed key of the persisted credential slot.
pub const CREDENTIAL_SLOT_KEY: &str = "authToken";

/// Session-scoped key/value storage backing the token store.
///
/// Implementations decide what "session" means (process lifetime, a runtime
/// directory, ...). Values are opaque strings.
pub trait SessionSlot: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory slot. Lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let slot = Self::new();
        slot.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        slot
    }
}

impl SessionSlot for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Observable state of the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Present,
    /// Never set, or cleared by logout.
    Absent,
    /// Cleared because the backend rejected it.
    Expired,
}

enum Cached {
    /// Nothing has been set in this process; consult the slot.
    Unknown,
    Known(Option<Credential>),
}

/// Process-wide holder of the bearer credential.
pub struct TokenStore {
    slot: Arc<dyn SessionSlot>,
    cached: Mutex<Cached>,
    state_tx: watch::Sender<CredentialState>,
}

impl TokenStore {
    pub fn new(slot: Arc<dyn SessionSlot>) -> Self {
        let initial = match slot.get(CREDENTIAL_SLOT_KEY) {
            Ok(Some(_)) => CredentialState::Present,
            Ok(None) => CredentialState::Absent,
            Err(e) => {
                tracing::warn!("[TokenStore] Failed to read credential slot: {}", e);
                CredentialState::Absent
            }
        };
        let (state_tx, _) = watch::channel(initial);

        Self {
            slot,
            cached: Mutex::new(Cached::Unknown),
            state_tx,
        }
    }

    /// A store backed by a fresh [`MemorySlot`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySlot::new()))
    }

    /// Returns the current credential, falling back to the persisted slot
    /// when nothing was set in this process.
    pub fn get(&self) -> Option<Credential> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        match &*cached {
            Cached::Known(credential) => credential.clone(),
            Cached::Unknown => match self.slot.get(CREDENTIAL_SLOT_KEY) {
                Ok(Some(token)) => {
                    let credential = Credential::new(token);
                    *cached = Cached::Known(Some(credential.clone()));
                    Some(credential)
                }
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!("[TokenStore] Failed to read credential slot: {}", e);
                    None
                }
            },
        }
    }

    pub fn has_credential(&self) -> bool {
        self.get().is_some()
    }

    /// Replaces the credential, persisting or clearing the slot.
    ///
    /// Slot failures are logged; the in-memory value is authoritative for
    /// the rest of the process either way.
    pub fn set(&self, credential: Option<Credential>) {
        let state = if credential.is_some() {
            CredentialState::Present
        } else {
            CredentialState::Absent
        };
        self.store(credential, state);
    }

    /// Clears the credential after the backend rejected it.
    pub fn expire(&self) {
        tracing::info!("[TokenStore] Credential rejected by backend, clearing");
        self.store(None, CredentialState::Expired);
    }

    pub fn state(&self) -> CredentialState {
        *self.state_tx.borrow()
    }

    /// Subscribes to credential state changes.
    pub fn subscribe(&self) -> watch::Receiver<CredentialState> {
        self.state_tx.subscribe()
    }

    fn store(&self, credential: Option<Credential>, state: CredentialState) {
        let persisted = match &credential {
            Some(credential) => self.slot.set(CREDENTIAL_SLOT_KEY, credential.expose()),
            None => self.slot.remove(CREDENTIAL_SLOT_KEY),
        };
        if let Err(e) = persisted {
            tracing::warn!("[TokenStore] Failed to update credential slot: {}", e);
        }

        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Cached::Known(credential);
        self.state_tx.send_replace(state);
    }
}
