//! OAuth 1.0a three-legged handshake
//!
//! [`AuthorizationAdapter`] obtains temporary credentials, sends the user to
//! the provider's authorization page and, on callback, exchanges the verifier
//! for token credentials and a [`NormalizedUser`].
//!
//! Temporary credentials are carried between the two legs either in the
//! user's session (stateful, the default) or in a shared cache keyed by a
//! random correlation key that travels through the callback URL as `tempId`
//! (stateless).

pub mod errors;
pub mod resolver;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::{CallbackParams, NormalizedUser};
use crate::oauth1::OAuth1Client;
use crate::store::{CacheStore, SessionStore};
use crate::utils::crypto::generate_correlation_key;
use crate::utils::logging::LoggingHelper;

pub use errors::HandshakeError;
pub use resolver::{CredentialResolver, CORRELATION_PARAM, DEFAULT_CACHE_TTL, SESSION_KEY};

/// How temporary credentials are correlated with the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandshakeMode {
    #[default]
    Stateful,
    Stateless,
}

impl fmt::Display for HandshakeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeMode::Stateful => f.write_str("stateful"),
            HandshakeMode::Stateless => f.write_str("stateless"),
        }
    }
}

/// Progress of a single handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    NotStarted,
    TemporaryCredentialsIssued,
    AwaitingCallback,
    VerifierReceived,
    TokenExchanged,
    Completed,
    Failed,
}

/// Immutable handshake configuration shared by every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Registered callback URI; never mutated per request
    pub callback_uri: String,
    /// Cache namespace for correlation entries, usually the provider name
    pub cache_namespace: String,
    pub cache_ttl: Duration,
}

impl HandshakeConfig {
    #[must_use]
    pub fn new(callback_uri: impl Into<String>, cache_namespace: impl Into<String>) -> Self {
        Self {
            callback_uri: callback_uri.into(),
            cache_namespace: cache_namespace.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Callback URI carrying `tempId=<correlation_key>`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured callback URI is not absolute
    pub fn correlated_callback_uri(&self, correlation_key: &str) -> Result<String, HandshakeError> {
        let mut url = Url::parse(&self.callback_uri).map_err(|e| {
            HandshakeError::Configuration(format!(
                "Invalid callback URI '{}': {e}",
                self.callback_uri
            ))
        })?;
        url.query_pairs_mut()
            .append_pair(CORRELATION_PARAM, correlation_key);
        Ok(url.to_string())
    }
}

/// Where to send the user agent after `redirect()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectInstruction {
    /// Provider authorization URL
    pub location: String,
    /// Correlation key embedded in the callback URI (stateless mode only)
    pub correlation_key: Option<String>,
}

/// Request-scoped driver of the OAuth1 handshake
pub struct AuthorizationAdapter {
    client: Arc<dyn OAuth1Client>,
    session: Arc<dyn SessionStore>,
    cache: Arc<dyn CacheStore>,
    config: HandshakeConfig,
    mode: HandshakeMode,
    phase: HandshakePhase,
    request: CallbackParams,
}

impl AuthorizationAdapter {
    #[must_use]
    pub fn new(
        client: Arc<dyn OAuth1Client>,
        session: Arc<dyn SessionStore>,
        cache: Arc<dyn CacheStore>,
        config: HandshakeConfig,
    ) -> Self {
        Self {
            client,
            session,
            cache,
            config,
            mode: HandshakeMode::default(),
            phase: HandshakePhase::NotStarted,
            request: CallbackParams::default(),
        }
    }

    /// Select the mode up front
    #[must_use]
    pub fn with_mode(mut self, mode: HandshakeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Switch to stateless mode
    ///
    /// Has no effect once the handshake has started.
    pub fn stateless(&mut self) -> &mut Self {
        if self.phase == HandshakePhase::NotStarted {
            self.mode = HandshakeMode::Stateless;
        } else if self.mode != HandshakeMode::Stateless {
            LoggingHelper::log_mode_switch_ignored(self.mode);
        }
        self
    }

    /// Attach the inbound callback parameters
    pub fn set_request(&mut self, params: CallbackParams) -> &mut Self {
        self.request = params;
        self
    }

    #[must_use]
    pub fn mode(&self) -> HandshakeMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> &HandshakeConfig {
        &self.config
    }

    fn resolver(&self) -> CredentialResolver {
        match self.mode {
            HandshakeMode::Stateful => CredentialResolver::Session(Arc::clone(&self.session)),
            HandshakeMode::Stateless => CredentialResolver::Cache {
                cache: Arc::clone(&self.cache),
                namespace: self.config.cache_namespace.clone(),
                ttl: self.config.cache_ttl,
            },
        }
    }

    /// Begin the handshake and return where to send the user
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call, the credential store or the
    /// callback URI fails. The handshake is then `Failed`.
    pub async fn redirect(&mut self) -> Result<RedirectInstruction, HandshakeError> {
        let result = self.begin().await;
        if result.is_err() {
            self.phase = HandshakePhase::Failed;
        }
        result
    }

    async fn begin(&mut self) -> Result<RedirectInstruction, HandshakeError> {
        let provider = self.client.provider_name().to_string();
        LoggingHelper::log_handshake_started(&provider, self.mode);

        let (callback_uri, correlation_key) = match self.mode {
            HandshakeMode::Stateful => (self.config.callback_uri.clone(), None),
            HandshakeMode::Stateless => {
                let key = generate_correlation_key();
                (self.config.correlated_callback_uri(&key)?, Some(key))
            }
        };

        let temporary = self.client.temporary_credentials(&callback_uri).await?;
        self.phase = HandshakePhase::TemporaryCredentialsIssued;
        LoggingHelper::log_temporary_credentials_issued(&provider, &temporary.identifier);

        self.resolver()
            .store(&temporary, correlation_key.as_deref())
            .await?;

        let location = self.client.authorization_url(&temporary)?;
        self.phase = HandshakePhase::AwaitingCallback;
        LoggingHelper::log_authorization_redirect(&provider, &location);

        Ok(RedirectInstruction {
            location,
            correlation_key,
        })
    }

    /// Complete the handshake from the attached callback parameters
    ///
    /// # Errors
    ///
    /// - [`HandshakeError::MissingVerifier`] when `oauth_token` or
    ///   `oauth_verifier` is absent; nothing else is touched in that case
    /// - [`HandshakeError::MissingCredentials`] when no stored temporary
    ///   credentials match the callback
    /// - [`HandshakeError::Provider`] when the token exchange or profile fetch fails
    pub async fn user(&mut self) -> Result<NormalizedUser, HandshakeError> {
        let result = self.complete().await;
        if result.is_err() {
            self.phase = HandshakePhase::Failed;
        }
        result
    }

    async fn complete(&mut self) -> Result<NormalizedUser, HandshakeError> {
        let (Some(oauth_token), Some(verifier)) = (self.request.token(), self.request.verifier())
        else {
            LoggingHelper::log_verifier_missing(
                self.request.token().is_some(),
                self.request.verifier().is_some(),
            );
            return Err(HandshakeError::MissingVerifier);
        };
        let (oauth_token, verifier) = (oauth_token.to_string(), verifier.to_string());
        self.phase = HandshakePhase::VerifierReceived;

        let Some(temporary) = self.resolver().take(&self.request).await? else {
            LoggingHelper::log_credentials_missing(self.mode);
            return Err(HandshakeError::MissingCredentials);
        };

        let provider = self.client.provider_name().to_string();
        LoggingHelper::log_token_exchange_start(&provider);
        let token = self
            .client
            .token_credentials(&temporary, &oauth_token, &verifier)
            .await?;
        self.phase = HandshakePhase::TokenExchanged;

        let profile = self.client.user_details(&token).await?;
        let user = NormalizedUser::from_profile(profile, &token);
        self.phase = HandshakePhase::Completed;
        LoggingHelper::log_handshake_completed(&provider, &user.id);

        Ok(user)
    }
}
