//! OAuth1 client error types

use thiserror::Error;

/// Errors surfaced by an OAuth1 client while talking to the provider
#[derive(Debug, Error)]
pub enum OAuth1Error {
    /// Transport failure (connection, TLS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be parsed or lacked required fields
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Temporary credentials response did not confirm the callback
    #[error("Provider did not confirm the callback URL")]
    CallbackNotConfirmed,

    /// Callback token does not match the stored temporary identifier
    #[error("Temporary identifier returned by the provider does not match the stored temporary credentials")]
    TokenMismatch,

    /// Client configuration is unusable (bad endpoint URL, missing credentials)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request signing failed
    #[error("Signature error: {0}")]
    Signature(String),
}

impl From<reqwest::Error> for OAuth1Error {
    fn from(err: reqwest::Error) -> Self {
        OAuth1Error::Network(err.to_string())
    }
}
