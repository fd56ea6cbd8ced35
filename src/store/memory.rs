//! In-process stores
//!
//! [`MemoryCache`] is the default correlation cache for a single-node
//! deployment. [`MemorySession`] backs flows with no cookie jar (API clients,
//! tests).

use super::{CacheStore, SessionStore};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of the current time, replaceable in tests
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Mutex-guarded TTL cache
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Clock,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until the next read, write or purge
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry and return how many were removed
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned
    pub fn purge_expired(&self) -> Result<usize> {
        let now = (self.clock)();
        let mut entries = self.lock()?;
        Ok(Self::retain_live(&mut entries, now))
    }

    fn retain_live(entries: &mut HashMap<String, CacheEntry>, now: DateTime<Utc>) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("Memory cache lock poisoned"))
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = (self.clock)();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                log::debug!("Cache entry expired (key length = {})", key.len());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| anyhow!("Cache TTL out of range: {e}"))?;
        let now = (self.clock)();
        let mut entries = self.lock()?;

        // Abandoned handshakes are never read back; sweep them on every write
        let purged = Self::retain_live(&mut entries, now);
        if purged > 0 {
            log::debug!("Purged {purged} expired cache entries");
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Session store held entirely in memory
#[derive(Debug, Default)]
pub struct MemorySession {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` currently holds a value
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values
            .lock()
            .is_ok_and(|values| values.contains_key(key))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow!("Memory session lock poisoned"))
    }
}

#[async_trait]
impl SessionStore for MemorySession {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
