//! Storage contracts used by the handshake adapter
//!
//! The adapter never reaches for ambient host services. Session storage and
//! short-term caching are injected through these traits.

pub mod cookie;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use cookie::{CookieFactory, CookieSession, SESSION_COOKIE_NAME};
pub use memory::{Clock, MemoryCache, MemorySession};

/// Per-user session storage for string values
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: String) -> Result<()>;

    async fn forget(&self, key: &str) -> Result<()>;
}

/// Shared key-value cache with per-entry expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value for `key`, or `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn forget(&self, key: &str) -> Result<()>;
}
