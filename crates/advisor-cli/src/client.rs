//! Wires the client components together for one CLI invocation.

use advisor_application::{AuthSession, ChatSessionManager, ViewController};
use advisor_core::api::AdvisorApi;
use advisor_core::auth::TokenStore;
use advisor_core::config::ClientConfig;
use advisor_infrastructure::{ConfigService, open_token_store};
use advisor_interaction::ApiGatewayClient;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Values given on the command line. They win over file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub session_dir: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, mut config: ClientConfig) -> Result<ClientConfig> {
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(dir) = &self.session_dir {
            config.session_dir = Some(dir.clone());
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Loads the effective configuration: file, then environment, then flags.
pub fn load_config(overrides: &Overrides) -> Result<ClientConfig> {
    let service = ConfigService::new().context("Failed to locate config file")?;
    let config = service
        .get_config()
        .with_context(|| format!("Failed to load {}", service.path().display()))?;
    overrides.apply(config)
}

pub struct Client {
    pub config: ClientConfig,
    pub tokens: Arc<TokenStore>,
    pub api: Arc<dyn AdvisorApi>,
    pub auth: Arc<AuthSession>,
    pub chat: Arc<ChatSessionManager>,
    pub controller: Arc<ViewController>,
}

impl Client {
    pub fn connect(overrides: &Overrides) -> Result<Self> {
        let config = load_config(overrides)?;
        let tokens = open_token_store(&config).context("Failed to open session storage")?;
        let api: Arc<dyn AdvisorApi> = Arc::new(
            ApiGatewayClient::new(&config, tokens.clone())
                .context("Failed to create API client")?,
        );
        let auth = Arc::new(AuthSession::new(api.clone(), tokens.clone()));
        let chat = Arc::new(ChatSessionManager::new(api.clone()));
        let controller = Arc::new(ViewController::new(
            &config,
            api.clone(),
            tokens.clone(),
            auth.clone(),
            chat.clone(),
        )?);

        tracing::debug!("[CLI] Connected to {}", config.api_base_url);
        Ok(Self {
            config,
            tokens,
            api,
            auth,
            chat,
            controller,
        })
    }

    /// Resolves the stored credential into an identity.
    ///
    /// # Errors
    ///
    /// Fails when nobody is signed in, with a hint on how to sign in.
    pub async fn require_login(&self) -> Result<()> {
        if self.auth.start().await.is_authenticated() {
            return Ok(());
        }
        anyhow::bail!("Not signed in. Run `advisor login` to get the sign-in URL.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let overrides = Overrides {
            api_url: Some("http://localhost:8080".to_string()),
            session_dir: Some(PathBuf::from("/tmp/advisor-session")),
        };

        let config = overrides.apply(ClientConfig::default()).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.session_dir, Some(PathBuf::from("/tmp/advisor-session")));
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let overrides = Overrides {
            api_url: Some("not a url".to_string()),
            ..Overrides::default()
        };

        assert!(overrides.apply(ClientConfig::default()).is_err());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let config = ClientConfig::default().with_api_base_url("http://backend.test");
        assert_eq!(Overrides::default().apply(config.clone()).unwrap(), config);
    }
}
