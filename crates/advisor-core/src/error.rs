//! Error types for the Financial Advisor client.

use thiserror::Error;

/// A shared error type for the whole client.
///
/// Variants follow the propagation policy of the client: authentication
/// failures are handled globally, mutating calls surface `Transport`, and
/// optional reads swallow `NonFatalRead` after logging it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvisorError {
    /// No credential is available locally; the request was never sent.
    #[error("Not authenticated: no credential available")]
    Unauthenticated,

    /// The backend rejected the credential (HTTP 401).
    #[error("Session expired: the backend rejected the credential")]
    SessionExpired,

    /// Network failure or non-success response on a required call.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Failure of a read that only populates optional data.
    #[error("Non-fatal read error: {0}")]
    NonFatalRead(String),

    /// A third-party account link (Google, HubSpot) could not be completed.
    #[error("{provider} link failed: {message}")]
    Link {
        provider: &'static str,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (session slot files, config files)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdvisorError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a NonFatalRead error
    pub fn non_fatal_read(message: impl Into<String>) -> Self {
        Self::NonFatalRead(message.into())
    }

    /// Creates a Link error for the given provider
    pub fn link(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Link {
            provider,
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// True for failures that mean the user must log in again.
    ///
    /// Both a missing credential and a rejected one route to the login view.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::SessionExpired)
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AdvisorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AdvisorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for AdvisorError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for AdvisorError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {}", err))
    }
}

/// A type alias for `Result<T, AdvisorError>`.
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classification() {
        assert!(AdvisorError::Unauthenticated.is_auth_failure());
        assert!(AdvisorError::SessionExpired.is_auth_failure());
        assert!(!AdvisorError::transport("boom").is_auth_failure());
        assert!(!AdvisorError::link("HubSpot", "denied").is_auth_failure());
    }

    #[test]
    fn test_link_error_message_names_provider() {
        let err = AdvisorError::link("HubSpot", "Authorization code is missing");
        assert_eq!(
            err.to_string(),
            "HubSpot link failed: Authorization code is missing"
        );
    }

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: AdvisorError = io.into();
        match err {
            AdvisorError::Io { message } => assert!(message.contains("PermissionDenied")),
            other => panic!("Expected Io error, got {other:?}"),
        }
    }
}
