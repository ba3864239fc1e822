//! Wiring of the token store onto the file-backed session slot.

use crate::paths::AdvisorPaths;
use crate::storage::FileSlot;
use advisor_core::Result;
use advisor_core::auth::TokenStore;
use advisor_core::config::ClientConfig;
use std::sync::Arc;

/// Builds the slot for `config`: the configured `session_dir`, or the
/// platform session directory.
pub fn session_slot(config: &ClientConfig) -> Result<FileSlot> {
    let dir = match &config.session_dir {
        Some(dir) => dir.clone(),
        None => AdvisorPaths::session_dir(),
    };
    Ok(FileSlot::new(dir))
}

/// Opens the process-wide token store backed by the session slot.
pub fn open_token_store(config: &ClientConfig) -> Result<Arc<TokenStore>> {
    let slot = session_slot(config)?;
    tracing::debug!("[SessionStore] Using credential slot in {:?}", slot.dir());
    Ok(Arc::new(TokenStore::new(Arc::new(slot))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::auth::Credential;
    use tempfile::TempDir;

    #[test]
    fn test_configured_session_dir_is_used() {
        let temp_dir = TempDir::new().unwrap();
        let config = ClientConfig {
            session_dir: Some(temp_dir.path().to_path_buf()),
            ..ClientConfig::default()
        };

        let store = open_token_store(&config).unwrap();
        store.set(Some(Credential::new("T")));

        assert!(temp_dir.path().join("authToken.json").exists());
        assert_eq!(
            open_token_store(&config).unwrap().get(),
            Some(Credential::new("T"))
        );
    }
}
