//! Unified path management for advisor configuration and session files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/advisor/           # Config directory
//! └── config.toml              # Client configuration
//!
//! $XDG_RUNTIME_DIR/advisor/    # Session directory (cleared at logout of the OS session)
//! └── authToken.json           # Credential slot
//! ```
//!
//! Platforms without a runtime directory fall back to a per-user directory
//! under the temp directory (`advisor-<uid>` on Unix).

use std::path::PathBuf;

const APP_DIR: &str = "advisor";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for advisor_core::AdvisorError {
    fn from(e: PathError) -> Self {
        advisor_core::AdvisorError::config(e.to_string())
    }
}

/// Unified path management for the advisor client.
pub struct AdvisorPaths;

impl AdvisorPaths {
    /// Returns the advisor configuration directory (e.g. `~/.config/advisor/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the directory holding session-scoped slots.
    pub fn session_dir() -> PathBuf {
        match dirs::runtime_dir() {
            Some(runtime) => runtime.join(APP_DIR),
            None => std::env::temp_dir().join(Self::shared_session_dir_name()),
        }
    }

    #[cfg(unix)]
    fn shared_session_dir_name() -> String {
        format!("{}-{}", APP_DIR, rustix::process::geteuid().as_raw())
    }

    #[cfg(not(unix))]
    fn shared_session_dir_name() -> String {
        APP_DIR.to_string()
    }
}
