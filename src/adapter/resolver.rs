//! Two-source lookup of temporary credentials

use std::sync::Arc;
use std::time::Duration;

use super::HandshakeError;
use crate::models::{CallbackParams, TemporaryCredentials};
use crate::store::{CacheStore, SessionStore};
use crate::utils::logging::LoggingHelper;

/// Session key holding the serialized temporary credentials
pub const SESSION_KEY: &str = "oauth.temp";

/// Callback query parameter carrying the correlation key
pub const CORRELATION_PARAM: &str = "tempId";

/// Lifetime of a correlation cache entry
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Where temporary credentials live between `redirect()` and `user()`
pub enum CredentialResolver {
    Session(Arc<dyn SessionStore>),
    Cache {
        cache: Arc<dyn CacheStore>,
        namespace: String,
        ttl: Duration,
    },
}

impl CredentialResolver {
    /// Cache key for a correlation key
    #[must_use]
    pub fn cache_key(namespace: &str, correlation_key: &str) -> String {
        format!("{namespace}:{correlation_key}")
    }

    /// Persist `temporary`; the cache variant requires the correlation key
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying store fails
    pub async fn store(
        &self,
        temporary: &TemporaryCredentials,
        correlation_key: Option<&str>,
    ) -> Result<(), HandshakeError> {
        let value = serde_json::to_string(temporary)
            .map_err(|e| HandshakeError::Storage(format!("Failed to serialize credentials: {e}")))?;

        match self {
            CredentialResolver::Session(session) => {
                session.put(SESSION_KEY, value).await?;
                LoggingHelper::log_session_entry_stored(SESSION_KEY);
            }
            CredentialResolver::Cache {
                cache,
                namespace,
                ttl,
            } => {
                let key = correlation_key.ok_or_else(|| {
                    HandshakeError::Configuration(
                        "Stateless handshake requires a correlation key".to_string(),
                    )
                })?;
                cache
                    .put(&Self::cache_key(namespace, key), value, *ttl)
                    .await?;
                LoggingHelper::log_correlation_entry_stored(namespace, key.len(), ttl.as_secs());
            }
        }
        Ok(())
    }

    /// Read and remove the temporary credentials for this callback
    ///
    /// Returns `None` when nothing is stored (or the cache entry expired, or
    /// the callback carries no correlation key in stateless mode).
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the stored value is corrupt
    pub async fn take(
        &self,
        params: &CallbackParams,
    ) -> Result<Option<TemporaryCredentials>, HandshakeError> {
        let stored = match self {
            CredentialResolver::Session(session) => {
                let value = session.get(SESSION_KEY).await?;
                if value.is_some() {
                    session.forget(SESSION_KEY).await?;
                }
                value
            }
            CredentialResolver::Cache {
                cache, namespace, ..
            } => {
                let Some(correlation_key) = params.correlation_key() else {
                    return Ok(None);
                };
                let key = Self::cache_key(namespace, correlation_key);
                let value = cache.get(&key).await?;
                if value.is_some() {
                    cache.forget(&key).await?;
                }
                value
            }
        };

        stored
            .map(|value| {
                serde_json::from_str::<TemporaryCredentials>(&value).map_err(|e| {
                    HandshakeError::Storage(format!("Stored credentials are corrupt: {e}"))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryCache, MemorySession};

    fn temporary() -> TemporaryCredentials {
        TemporaryCredentials {
            identifier: "temp-id".to_string(),
            secret: "temp-secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_session_store_and_take_once() {
        let session = Arc::new(MemorySession::new());
        let resolver = CredentialResolver::Session(session.clone());

        resolver.store(&temporary(), None).await.unwrap();
        assert!(session.contains(SESSION_KEY));

        let params = CallbackParams::default();
        assert_eq!(resolver.take(&params).await.unwrap(), Some(temporary()));
        assert!(!session.contains(SESSION_KEY));
        assert_eq!(resolver.take(&params).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_uses_namespaced_key() {
        let cache = Arc::new(MemoryCache::new());
        let resolver = CredentialResolver::Cache {
            cache: cache.clone(),
            namespace: "bitbucket".to_string(),
            ttl: DEFAULT_CACHE_TTL,
        };

        resolver.store(&temporary(), Some("abc")).await.unwrap();
        assert!(cache.get("bitbucket:abc").await.unwrap().is_some());

        let params = CallbackParams {
            temp_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(resolver.take(&params).await.unwrap(), Some(temporary()));
        assert_eq!(resolver.take(&params).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_without_correlation_key() {
        let resolver = CredentialResolver::Cache {
            cache: Arc::new(MemoryCache::new()),
            namespace: "ns".to_string(),
            ttl: DEFAULT_CACHE_TTL,
        };

        assert!(matches!(
            resolver.store(&temporary(), None).await,
            Err(HandshakeError::Configuration(_))
        ));
        assert_eq!(resolver.take(&CallbackParams::default()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_storage_error() {
        let session = Arc::new(MemorySession::new());
        session
            .put(SESSION_KEY, "not json".to_string())
            .await
            .unwrap();
        let resolver = CredentialResolver::Session(session);

        assert!(matches!(
            resolver.take(&CallbackParams::default()).await,
            Err(HandshakeError::Storage(_))
        ));
    }
}
