// Centralized logging helpers for the OAuth1 handshake
use crate::adapter::HandshakeMode;
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the start of a handshake
    pub fn log_handshake_started(provider: &str, mode: HandshakeMode) {
        info!("🔧 Starting OAuth1 handshake with {provider} ({mode} mode)");
    }

    /// Log that temporary credentials were issued by the provider
    pub fn log_temporary_credentials_issued(provider: &str, identifier: &str) {
        info!(
            "✅ Temporary credentials issued by {provider} (identifier length = {})",
            identifier.len()
        );
    }

    /// Log that temporary credentials were stored in the session
    pub fn log_session_entry_stored(key: &str) {
        debug!("Stored temporary credentials in session under '{key}'");
    }

    /// Log that temporary credentials were stored in the correlation cache
    pub fn log_correlation_entry_stored(namespace: &str, key_len: usize, ttl_secs: u64) {
        debug!(
            "Stored temporary credentials in cache namespace '{namespace}' (key length = {key_len}, ttl = {ttl_secs}s)"
        );
    }

    /// Log the redirect to the authorization page
    pub fn log_authorization_redirect(provider: &str, url: &str) {
        info!("🔍 Redirecting to {provider} authorization page: {url}");
    }

    /// Log a callback that lacks the token or verifier
    pub fn log_verifier_missing(has_token: bool, has_verifier: bool) {
        warn!(
            "OAuth1 callback rejected: oauth_token={}, oauth_verifier={}",
            if has_token { "present" } else { "missing" },
            if has_verifier { "present" } else { "missing" }
        );
    }

    /// Log that no temporary credentials could be resolved
    pub fn log_credentials_missing(mode: HandshakeMode) {
        warn!("❌ No temporary credentials found for callback ({mode} mode)");
    }

    /// Log token exchange start
    pub fn log_token_exchange_start(provider: &str) {
        info!("🔄 Exchanging OAuth1 verifier for token credentials with {provider}");
    }

    /// Log handshake completion
    pub fn log_handshake_completed(provider: &str, user_id: &str) {
        info!("🎯 OAuth1 handshake with {provider} completed for user {user_id}");
    }

    /// Log a mode switch that arrived after the handshake started
    pub fn log_mode_switch_ignored(current: HandshakeMode) {
        warn!("Ignoring request to switch to stateless mode: handshake already started in {current} mode");
    }

    /// Log provider responses for debugging; bodies carry secrets so only the size is logged
    pub fn log_provider_response(endpoint: &str, status: u16, body_len: usize) {
        debug!("{endpoint} responded with status {status} ({body_len} bytes)");
    }
}
