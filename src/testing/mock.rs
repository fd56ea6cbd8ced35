//! Mock OAuth1 provider client
//!
//! Behaves like a well-behaved provider: it hands out fixed credentials,
//! rejects a callback token that does not match the issued temporary
//! identifier, and records every call for assertions.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::constants::{
    TEST_AUTHORIZE_URL, TEST_PROVIDER, TEST_TEMP_IDENTIFIER, TEST_TEMP_SECRET,
    TEST_TOKEN_IDENTIFIER, TEST_TOKEN_SECRET,
};
use super::fixtures::TestFixtures;
use crate::models::{ProviderProfile, TemporaryCredentials, TokenCredentials};
use crate::oauth1::client::build_authorization_url;
use crate::oauth1::{OAuth1Client, OAuth1Error};

/// Provider call that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStep {
    TemporaryCredentials,
    TokenCredentials,
    UserDetails,
}

/// Calls observed by the mock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub temporary_credentials: usize,
    pub token_credentials: usize,
    pub user_details: usize,
    /// Callback URIs passed to `temporary_credentials`, in order
    pub callback_uris: Vec<String>,
    /// `(temporary identifier, oauth_token, verifier)` passed to `token_credentials`
    pub exchanges: Vec<(String, String, String)>,
}

impl MockCalls {
    /// Total number of provider calls
    #[must_use]
    pub fn total(&self) -> usize {
        self.temporary_credentials + self.token_credentials + self.user_details
    }
}

/// Recording OAuth1 client
pub struct MockOAuth1Client {
    temporary: TemporaryCredentials,
    token: TokenCredentials,
    profile: ProviderProfile,
    failing_step: Option<MockStep>,
    calls: Mutex<MockCalls>,
}

impl Default for MockOAuth1Client {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOAuth1Client {
    /// Mock returning the jdoe profile
    #[must_use]
    pub fn new() -> Self {
        Self {
            temporary: TemporaryCredentials {
                identifier: TEST_TEMP_IDENTIFIER.to_string(),
                secret: TEST_TEMP_SECRET.to_string(),
            },
            token: TokenCredentials {
                identifier: TEST_TOKEN_IDENTIFIER.to_string(),
                secret: TEST_TOKEN_SECRET.to_string(),
            },
            profile: TestFixtures::jdoe_profile(),
            failing_step: None,
            calls: Mutex::new(MockCalls::default()),
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: ProviderProfile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub fn with_temporary_credentials(mut self, temporary: TemporaryCredentials) -> Self {
        self.temporary = temporary;
        self
    }

    /// Make `step` fail with a network error
    #[must_use]
    pub fn failing_at(mut self, step: MockStep) -> Self {
        self.failing_step = Some(step);
        self
    }

    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Snapshot of recorded calls
    ///
    /// # Panics
    ///
    /// Panics if the call log lock is poisoned
    #[must_use]
    pub fn calls(&self) -> MockCalls {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, f: impl FnOnce(&mut MockCalls)) {
        if let Ok(mut calls) = self.calls.lock() {
            f(&mut calls);
        }
    }

    fn check(&self, step: MockStep) -> Result<(), OAuth1Error> {
        if self.failing_step == Some(step) {
            return Err(OAuth1Error::Network(format!("simulated failure at {step:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl OAuth1Client for MockOAuth1Client {
    fn provider_name(&self) -> &str {
        TEST_PROVIDER
    }

    async fn temporary_credentials(
        &self,
        callback_uri: &str,
    ) -> Result<TemporaryCredentials, OAuth1Error> {
        self.record(|calls| {
            calls.temporary_credentials += 1;
            calls.callback_uris.push(callback_uri.to_string());
        });
        self.check(MockStep::TemporaryCredentials)?;
        Ok(self.temporary.clone())
    }

    fn authorization_url(&self, temporary: &TemporaryCredentials) -> Result<String, OAuth1Error> {
        build_authorization_url(TEST_AUTHORIZE_URL, temporary)
    }

    async fn token_credentials(
        &self,
        temporary: &TemporaryCredentials,
        oauth_token: &str,
        verifier: &str,
    ) -> Result<TokenCredentials, OAuth1Error> {
        self.record(|calls| {
            calls.token_credentials += 1;
            calls.exchanges.push((
                temporary.identifier.clone(),
                oauth_token.to_string(),
                verifier.to_string(),
            ));
        });
        self.check(MockStep::TokenCredentials)?;
        if oauth_token != temporary.identifier || *temporary != self.temporary {
            return Err(OAuth1Error::TokenMismatch);
        }
        Ok(self.token.clone())
    }

    async fn user_details(&self, token: &TokenCredentials) -> Result<ProviderProfile, OAuth1Error> {
        self.record(|calls| calls.user_details += 1);
        self.check(MockStep::UserDetails)?;
        if *token != self.token {
            return Err(OAuth1Error::Status {
                status: 401,
                body: "invalid token".to_string(),
            });
        }
        Ok(self.profile.clone())
    }
}
