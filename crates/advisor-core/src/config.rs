//! Client configuration model.

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Hosted backend used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://ai-financial-agent-vq2w.onrender.com";

/// Fixed request timeout applied to every backend call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the advisor backend, without a trailing slash.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Directory holding the session-scoped credential slot. `None` uses
    /// the platform runtime directory.
    pub session_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parses the base URL, normalizing away a trailing slash.
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(AdvisorError::config("api_base_url is empty"));
        }
        Ok(Url::parse(trimmed)?)
    }

    /// Backend entry point of the Google OAuth flow (the Login view's button).
    pub fn google_login_url(&self) -> Result<Url> {
        Ok(self.base_url()?.join("/oauth2/authorization/google")?)
    }

    /// Checks the values a client cannot start without.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.request_timeout_secs == 0 {
            return Err(AdvisorError::config("request_timeout_secs must be > 0"));
        }
        Ok(())
    }
}
