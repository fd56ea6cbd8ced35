//! Test fixtures providing pre-built test objects

use std::sync::Arc;

use actix_web::{cookie::Cookie, test, HttpRequest};

use super::constants::{
    TEST_CALLBACK_URI, TEST_PROVIDER, TEST_SESSION_SECRET, TEST_TEMP_IDENTIFIER, TEST_VERIFIER,
};
use crate::adapter::{AuthorizationAdapter, HandshakeConfig, HandshakeMode};
use crate::handlers::HandshakeServices;
use crate::models::{CallbackParams, ProviderProfile};
use crate::oauth1::OAuth1Client;
use crate::store::{CacheStore, CookieFactory, MemoryCache, MemorySession};
use crate::utils::crypto::derive_encryption_key;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Provider profile for Jane Doe
    #[must_use]
    pub fn jdoe_profile() -> ProviderProfile {
        ProviderProfile {
            uid: "42".to_string(),
            nickname: Some("jdoe".to_string()),
            name: Some("Jane Doe".to_string()),
            email: Some("j@example.com".to_string()),
            image_url: Some("http://x/img.png".to_string()),
            raw: serde_json::json!({
                "uid": "42",
                "nickname": "jdoe",
                "name": "Jane Doe",
                "email": "j@example.com",
                "imageUrl": "http://x/img.png"
            }),
        }
    }

    #[must_use]
    pub fn handshake_config() -> HandshakeConfig {
        HandshakeConfig::new(TEST_CALLBACK_URI, TEST_PROVIDER)
    }

    #[must_use]
    pub fn cookie_factory() -> CookieFactory {
        CookieFactory::new(derive_encryption_key(TEST_SESSION_SECRET), false, 15)
    }

    /// Stateful adapter over a fresh memory session and cache
    #[must_use]
    pub fn adapter(client: Arc<dyn OAuth1Client>) -> AuthorizationAdapter {
        AuthorizationAdapter::new(
            client,
            Arc::new(MemorySession::new()),
            Arc::new(MemoryCache::new()),
            Self::handshake_config(),
        )
    }

    /// Callback carrying the mock's temporary identifier and the test verifier
    #[must_use]
    pub fn callback_params(temp_id: Option<&str>) -> CallbackParams {
        CallbackParams {
            oauth_token: Some(TEST_TEMP_IDENTIFIER.to_string()),
            oauth_verifier: Some(TEST_VERIFIER.to_string()),
            temp_id: temp_id.map(ToString::to_string),
        }
    }

    /// Handler services around `client` and `cache`
    #[must_use]
    pub fn services(
        client: Arc<dyn OAuth1Client>,
        cache: Arc<dyn CacheStore>,
        mode: HandshakeMode,
    ) -> HandshakeServices {
        HandshakeServices {
            client,
            cache,
            cookies: Self::cookie_factory(),
            config: Self::handshake_config(),
            mode,
        }
    }

    /// Request carrying `cookie`
    #[must_use]
    pub fn request_with_cookie(cookie: Cookie<'static>) -> HttpRequest {
        test::TestRequest::default().cookie(cookie).to_http_request()
    }
}
