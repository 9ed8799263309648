//! Error types used throughout the bridge

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for HubBridge
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// The service-user listing could not be refreshed.
    #[error("Credential refresh failed: {0}")]
    CredentialRefresh(String),

    /// The notification stream could not be opened.
    #[error("Notification connection error: {0}")]
    Connection(String),

    #[error("Acknowledge failed: {0}")]
    Acknowledge(String),

    #[error("Broker error: {0}")]
    Broker(String),

    /// The platform answered with an unexpected status.
    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::CredentialRefresh(_) => "credential_refresh",
            Self::Connection(_) => "connection",
            Self::Acknowledge(_) => "acknowledge",
            Self::Broker(_) => "broker",
            Self::Platform(_) => "platform",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(BridgeError::CredentialRefresh("x".into()).label(), "credential_refresh");
        assert_eq!(BridgeError::NotFound("x".into()).label(), "not_found");
        assert_eq!(BridgeError::Broker("x".into()).label(), "broker");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(BridgeError::Acknowledge("socket closed".into())).unwrap();
        assert_eq!(json["type"], "Acknowledge");
        assert_eq!(json["message"], "socket closed");
    }

    #[test]
    fn display_includes_context() {
        let err = BridgeError::Connection("handshake refused".into());
        assert_eq!(err.to_string(), "Notification connection error: handshake refused");
    }
}
