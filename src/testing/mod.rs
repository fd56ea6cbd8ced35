//! Testing utilities for latchkey
//!
//! - [`fixtures`] - Pre-built test data (credentials, profiles, services)
//! - [`mock`] - Recording OAuth1 client that never touches the network
//!
//! ```rust
//! use latchkey::testing::{fixtures::TestFixtures, mock::MockOAuth1Client};
//!
//! let client = MockOAuth1Client::new();
//! let adapter = TestFixtures::adapter(client.into_shared());
//! assert_eq!(adapter.mode(), latchkey::HandshakeMode::Stateful);
//! ```

pub mod fixtures;
pub mod mock;

pub use crate::store::MemorySession;
pub use fixtures::TestFixtures;
pub use mock::{MockOAuth1Client, MockStep};

/// Common test constants
pub mod constants {
    /// Callback URI registered for the test provider
    pub const TEST_CALLBACK_URI: &str = "https://app.example/auth/oauth1/callback";

    /// Provider name and cache namespace
    pub const TEST_PROVIDER: &str = "testprovider";

    /// Authorization endpoint used by the mock client
    pub const TEST_AUTHORIZE_URL: &str = "https://provider.test/oauth/authorize";

    /// Temporary credentials issued by the mock client
    pub const TEST_TEMP_IDENTIFIER: &str = "temp-identifier";
    pub const TEST_TEMP_SECRET: &str = "temp-secret";

    /// Token credentials issued by the mock client
    pub const TEST_TOKEN_IDENTIFIER: &str = "token-identifier";
    pub const TEST_TOKEN_SECRET: &str = "token-secret";

    /// Verifier echoed in test callbacks
    pub const TEST_VERIFIER: &str = "verifier-123";

    /// Session secret for cookie encryption in tests
    pub const TEST_SESSION_SECRET: &[u8] = b"test_key_32_bytes_long_for_test_";
}
