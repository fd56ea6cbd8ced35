use crate::oauth1::OAuth1Error;
use thiserror::Error;

/// Failures that end a handshake attempt
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Callback arrived without `oauth_token` or `oauth_verifier`
    #[error("Callback request is missing oauth_token or oauth_verifier")]
    MissingVerifier,

    /// No temporary credentials could be found for the callback
    #[error("No temporary credentials found for this callback")]
    MissingCredentials,

    #[error("Provider error: {0}")]
    Provider(#[from] OAuth1Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl HandshakeError {
    /// Short machine-readable code used in error responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            HandshakeError::MissingVerifier => "missing_verifier",
            HandshakeError::MissingCredentials => "missing_credentials",
            HandshakeError::Provider(_) => "provider_error",
            HandshakeError::Storage(_) => "storage_error",
            HandshakeError::Configuration(_) => "configuration_error",
        }
    }
}

impl From<anyhow::Error> for HandshakeError {
    fn from(err: anyhow::Error) -> Self {
        HandshakeError::Storage(err.to_string())
    }
}
