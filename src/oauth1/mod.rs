//! OAuth 1.0a provider protocol: request signing, provider client and profile mapping

pub mod client;
pub mod errors;
pub mod profile;
pub mod signature;

pub use client::{ClientCredentials, HttpOAuth1Client, OAuth1Client, ServerEndpoints};
pub use errors::OAuth1Error;
pub use profile::ProfileFieldMap;
pub use signature::{OAuthSigner, SignatureMethod};
