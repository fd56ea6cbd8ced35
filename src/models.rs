//! Handshake data model
//!
//! Credential pairs exchanged with the provider, the provider profile, the
//! normalized user handed back to the application and the inbound callback
//! parameters.

use serde::{Deserialize, Serialize};

/// Short-lived request-token pair used only to obtain user authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryCredentials {
    pub identifier: String,
    pub secret: String,
}

/// Long-lived access-token pair representing the authenticated grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCredentials {
    pub identifier: String,
    pub secret: String,
}

/// Provider-specific user details as returned by the OAuth1 client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub uid: String,
    pub nickname: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    /// Untouched provider payload
    pub raw: serde_json::Value,
}

/// Normalized user produced by a completed handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedUser {
    pub id: String,
    pub nickname: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub raw: serde_json::Value,
    pub token: String,
    pub token_secret: String,
}

impl NormalizedUser {
    /// Map a provider profile and the token credentials into a normalized user
    #[must_use]
    pub fn from_profile(profile: ProviderProfile, token: &TokenCredentials) -> Self {
        Self {
            id: profile.uid,
            nickname: profile.nickname,
            name: profile.name,
            email: profile.email,
            avatar: profile.image_url,
            raw: profile.raw,
            token: token.identifier.clone(),
            token_secret: token.secret.clone(),
        }
    }
}

/// Parameters the provider sends back to the callback URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
    #[serde(rename = "tempId")]
    pub temp_id: Option<String>,
}

impl CallbackParams {
    /// Token identifier echoed by the provider, if present and non-empty
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        non_empty(self.oauth_token.as_deref())
    }

    /// Verifier issued by the provider, if present and non-empty
    #[must_use]
    pub fn verifier(&self) -> Option<&str> {
        non_empty(self.oauth_verifier.as_deref())
    }

    /// Correlation key echoed back in stateless mode, if present and non-empty
    #[must_use]
    pub fn correlation_key(&self) -> Option<&str> {
        non_empty(self.temp_id.as_deref())
    }

    /// Merge two parameter sources field by field, `self` winning where set
    ///
    /// A provider may POST the token and verifier to a callback URL whose
    /// query string still carries `tempId`.
    #[must_use]
    pub fn or(self, fallback: CallbackParams) -> CallbackParams {
        CallbackParams {
            oauth_token: self.oauth_token.or(fallback.oauth_token),
            oauth_verifier: self.oauth_verifier.or(fallback.oauth_verifier),
            temp_id: self.temp_id.or(fallback.temp_id),
        }
    }
}

// Blank means missing; non-blank values are passed through untouched
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
