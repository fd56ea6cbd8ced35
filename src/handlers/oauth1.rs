// OAuth1 sign-in and callback handlers
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{debug, error};
use std::sync::Arc;

use crate::adapter::{AuthorizationAdapter, HandshakeConfig, HandshakeMode};
use crate::models::CallbackParams;
use crate::oauth1::{OAuth1Client, OAuth1Error};
use crate::settings::LatchkeySettings;
use crate::store::{CacheStore, CookieFactory, CookieSession, MemoryCache, SessionStore};
use crate::utils::crypto::derive_encryption_key;
use crate::utils::responses::ResponseBuilder;

/// Shared collaborators used to build a request-scoped adapter
#[derive(Clone)]
pub struct HandshakeServices {
    pub client: Arc<dyn OAuth1Client>,
    pub cache: Arc<dyn CacheStore>,
    pub cookies: CookieFactory,
    pub config: HandshakeConfig,
    pub mode: HandshakeMode,
}

impl HandshakeServices {
    /// Wire the provider client, memory cache and cookie factory from settings
    ///
    /// # Errors
    ///
    /// Returns an error if the provider client cannot be configured
    pub fn from_settings(settings: &LatchkeySettings) -> Result<Self, OAuth1Error> {
        let client = settings.provider.build_client()?;
        let cookies = CookieFactory::new(
            derive_encryption_key(settings.session.session_secret.as_bytes()),
            settings.cookies.secure,
            settings.session.cookie_minutes,
        );

        Ok(Self {
            client: Arc::new(client),
            cache: Arc::new(MemoryCache::new()),
            cookies,
            config: settings.handshake_config(),
            mode: settings.handshake_mode(),
        })
    }

    /// Adapter bound to one request's session
    #[must_use]
    pub fn adapter(&self, session: Arc<dyn SessionStore>) -> AuthorizationAdapter {
        AuthorizationAdapter::new(
            Arc::clone(&self.client),
            session,
            Arc::clone(&self.cache),
            self.config.clone(),
        )
        .with_mode(self.mode)
    }
}

/// Begin the handshake and redirect to the provider
///
/// # Errors
///
/// Never returns `Err`; failures are rendered as JSON error responses
pub async fn oauth1_sign_in(
    req: HttpRequest,
    services: web::Data<HandshakeServices>,
) -> Result<HttpResponse> {
    let session = Arc::new(CookieSession::from_request(&req, &services.cookies));
    let mut adapter = services.adapter(session.clone());

    let instruction = match adapter.redirect().await {
        Ok(instruction) => instruction,
        Err(e) => {
            error!("Failed to begin OAuth1 handshake: {e}");
            return Ok(ResponseBuilder::handshake_error(&e));
        }
    };

    let mut response = ResponseBuilder::redirect(&instruction.location);
    match session.to_cookie() {
        Ok(Some(cookie)) => response = response.with_cookie(cookie),
        Ok(None) => {}
        Err(e) => {
            error!("Failed to write session cookie: {e}");
            return Ok(ResponseBuilder::internal_server_error()
                .with_error_code("session_error")
                .with_message("Failed to persist the handshake session")
                .build());
        }
    }
    Ok(response.build())
}

/// Complete the handshake and return the normalized user
///
/// # Errors
///
/// Never returns `Err`; failures are rendered as JSON error responses
pub async fn oauth1_callback(
    req: HttpRequest,
    query: web::Query<CallbackParams>,
    form: Option<web::Form<CallbackParams>>,
    services: web::Data<HandshakeServices>,
) -> Result<HttpResponse> {
    let params = extract_callback_params(query, form);
    let session = Arc::new(CookieSession::from_request(&req, &services.cookies));
    let mut adapter = services.adapter(session.clone());
    adapter.set_request(params);

    let result = adapter.user().await;

    // Consumed credentials leave the session; clear the cookie either way
    let cookie = session.to_cookie().unwrap_or_else(|e| {
        error!("Failed to write session cookie: {e}");
        Some(services.cookies.create_expired_cookie())
    });

    match result {
        Ok(user) => {
            let mut builder = HttpResponse::Ok();
            if let Some(cookie) = cookie {
                builder.cookie(cookie);
            }
            Ok(builder.json(user))
        }
        Err(e) => {
            error!("OAuth1 callback failed: {e}");
            let mut response = ResponseBuilder::handshake_error(&e);
            if let Some(cookie) = cookie {
                if let Err(err) = response.add_cookie(&cookie) {
                    error!("Failed to attach session cookie: {err}");
                }
            }
            Ok(response)
        }
    }
}

/// Callback parameters from a form post merged over the query string
fn extract_callback_params(
    query: web::Query<CallbackParams>,
    form: Option<web::Form<CallbackParams>>,
) -> CallbackParams {
    if let Some(form_data) = form {
        debug!("OAuth1 callback received via form post");
        form_data.into_inner().or(query.into_inner())
    } else {
        debug!("OAuth1 callback received via query");
        query.into_inner()
    }
}
