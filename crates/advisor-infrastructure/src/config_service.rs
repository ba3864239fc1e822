//! Configuration service implementation.
//!
//! Loads the client configuration from `~/.config/advisor/config.toml` and
//! layers environment overrides on top of it.

use crate::paths::AdvisorPaths;
use crate::storage::AtomicTomlFile;
use advisor_core::config::ClientConfig;
use advisor_core::{AdvisorError, Result};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Overrides `api_base_url`.
pub const ENV_API_URL: &str = "ADVISOR_API_URL";
/// Overrides `request_timeout_secs`.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ADVISOR_REQUEST_TIMEOUT_SECS";
/// Overrides `session_dir`.
pub const ENV_SESSION_DIR: &str = "ADVISOR_SESSION_DIR";

/// Configuration service that loads and caches the client configuration.
///
/// A missing file is not an error; defaults apply. A malformed file is.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService reading the default config file.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(AdvisorPaths::config_file()?))
    }

    /// Creates a ConfigService reading a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the configuration with environment overrides applied, loading
    /// from file if not cached.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = apply_env_overrides(self.load_file()?, |key| std::env::var(key).ok())?;
        loaded.validate()?;

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    /// Writes a configuration file with the default values if none exists.
    ///
    /// # Returns
    ///
    /// `true` if a file was created.
    pub fn ensure_config_file(&self) -> Result<bool> {
        let file = AtomicTomlFile::<ClientConfig>::new(self.path.clone());
        if file.load()?.is_some() {
            return Ok(false);
        }
        file.save(&ClientConfig::default())?;
        tracing::info!("[Config] Wrote default configuration to {:?}", self.path);
        Ok(true)
    }

    fn load_file(&self) -> Result<ClientConfig> {
        let file = AtomicTomlFile::<ClientConfig>::new(self.path.clone());
        match file.load()? {
            Some(config) => {
                tracing::debug!("[Config] Loaded configuration from {:?}", self.path);
                Ok(config)
            }
            None => {
                tracing::debug!("[Config] No configuration at {:?}, using defaults", self.path);
                Ok(ClientConfig::default())
            }
        }
    }
}

/// Applies `ADVISOR_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(mut config: ClientConfig, lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        config.api_base_url = url;
    }

    if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
        config.request_timeout_secs = raw.trim().parse().map_err(|_| {
            AdvisorError::config(format!("{} must be an integer, got {:?}", ENV_REQUEST_TIMEOUT_SECS, raw))
        })?;
    }

    if let Some(dir) = lookup(ENV_SESSION_DIR).filter(|v| !v.trim().is_empty()) {
        config.session_dir = Some(PathBuf::from(dir));
    }

    Ok(config)
}
