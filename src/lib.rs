#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the latchkey application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapter;
pub mod handlers;
pub mod models;
pub mod oauth1;
pub mod settings;
pub mod store;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use adapter::{
    AuthorizationAdapter, HandshakeConfig, HandshakeError, HandshakeMode, HandshakePhase,
    RedirectInstruction,
};
pub use handlers::{health, oauth1_callback, oauth1_sign_in, HandshakeServices};
pub use models::{CallbackParams, NormalizedUser, TemporaryCredentials, TokenCredentials};
pub use oauth1::{HttpOAuth1Client, OAuth1Client, OAuth1Error};
pub use settings::LatchkeySettings;
