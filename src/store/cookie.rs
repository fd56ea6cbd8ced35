use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    HttpRequest,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use super::SessionStore;
use crate::utils::crypto::{decrypt_data, encrypt_data};

/// Name of the encrypted session cookie
pub const SESSION_COOKIE_NAME: &str = "latchkey_session";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: CookieDuration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            // must accompany the top-level redirect back from the provider
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: CookieDuration::minutes(15),
        }
    }
}

/// Creates and reads the encrypted session cookie
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; 32],
    cookie_secure: bool,
    cookie_minutes: u64,
}

impl CookieFactory {
    #[must_use]
    pub fn new(encryption_key: [u8; 32], cookie_secure: bool, cookie_minutes: u64) -> Self {
        Self {
            encryption_key,
            cookie_secure,
            cookie_minutes,
        }
    }

    /// Generic method to create a cookie with encrypted data
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_cookie<T: Serialize>(
        &self,
        name: &str,
        data: &T,
        options: CookieOptions,
    ) -> Result<Cookie<'static>> {
        let value = encrypt_data(data, &self.encryption_key)?;

        Ok(Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish())
    }

    /// Create the session cookie carrying `values`
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_session_cookie(&self, values: &HashMap<String, String>) -> Result<Cookie<'static>> {
        self.create_cookie(
            SESSION_COOKIE_NAME,
            values,
            CookieOptions {
                max_age: CookieDuration::minutes(i64::try_from(self.cookie_minutes).unwrap_or(15)),
                ..Default::default()
            },
        )
    }

    /// Create an expired cookie to clear the session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(SESSION_COOKIE_NAME, self.cookie_secure)
    }

    /// Session values carried by the request (empty when absent or undecryptable)
    #[must_use]
    pub fn session_from_request(&self, req: &HttpRequest) -> HashMap<String, String> {
        req.cookie(SESSION_COOKIE_NAME).map_or_else(HashMap::new, |cookie| {
            decrypt_data::<HashMap<String, String>>(cookie.value(), &self.encryption_key)
                .unwrap_or_else(|e| {
                    log::warn!("Failed to decrypt session cookie: {e}");
                    HashMap::new()
                })
        })
    }
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(CookieDuration::seconds(-1))
        .finish()
}

#[derive(Debug, Default)]
struct SessionState {
    values: HashMap<String, String>,
    dirty: bool,
}

/// Request-scoped session backed by the encrypted `latchkey_session` cookie
///
/// Values are decrypted when the session is opened and written back through
/// [`CookieSession::to_cookie`] only when something changed.
pub struct CookieSession {
    state: Mutex<SessionState>,
    factory: CookieFactory,
}

impl CookieSession {
    /// Open the session carried by `req`
    #[must_use]
    pub fn from_request(req: &HttpRequest, factory: &CookieFactory) -> Self {
        Self {
            state: Mutex::new(SessionState {
                values: factory.session_from_request(req),
                dirty: false,
            }),
            factory: factory.clone(),
        }
    }

    /// Cookie to attach to the response
    ///
    /// `None` when the session is unchanged; an expired cookie when the session
    /// was emptied; otherwise the re-encrypted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session lock is poisoned or encryption fails
    pub fn to_cookie(&self) -> Result<Option<Cookie<'static>>> {
        let state = self.lock()?;
        if !state.dirty {
            return Ok(None);
        }
        if state.values.is_empty() {
            return Ok(Some(self.factory.create_expired_cookie()));
        }
        self.factory.create_session_cookie(&state.values).map(Some)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("Cookie session lock poisoned"))
    }
}

#[async_trait]
impl SessionStore for CookieSession {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        let mut state = self.lock()?;
        state.values.insert(key.to_string(), value);
        state.dirty = true;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<()> {
        let mut state = self.lock()?;
        if state.values.remove(key).is_some() {
            state.dirty = true;
        }
        Ok(())
    }
}
