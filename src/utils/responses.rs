//! HTTP response helpers
//!
//! JSON error bodies share one shape, `{"error": <code>, "message": <text>}`.

use actix_web::{cookie::Cookie, http::header, HttpResponse};
use log::warn;
use serde_json::json;

use crate::adapter::HandshakeError;
use crate::oauth1::OAuth1Error;

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create a `BadRequest` (400) error response
    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadRequest)
    }

    /// Create an `Unauthorized` (401) error response
    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Unauthorized)
    }

    /// Create an `InternalServerError` (500) error response
    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::InternalServerError)
    }

    /// Create a `BadGateway` (502) error response
    #[must_use]
    pub fn bad_gateway() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadGateway)
    }

    /// Create a redirect response (302 Found) with optional cookies
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder::new(location)
    }

    /// Map a handshake failure onto its HTTP response
    #[must_use]
    pub fn handshake_error(err: &HandshakeError) -> HttpResponse {
        let builder = match err {
            HandshakeError::MissingVerifier => Self::bad_request(),
            HandshakeError::MissingCredentials => Self::unauthorized(),
            HandshakeError::Provider(OAuth1Error::Configuration(_) | OAuth1Error::Signature(_))
            | HandshakeError::Storage(_)
            | HandshakeError::Configuration(_) => Self::internal_server_error(),
            HandshakeError::Provider(_) => Self::bad_gateway(),
        };
        builder
            .with_error_code(err.code())
            .with_message(&Self::client_message(err))
            .build()
    }

    /// Message safe to show the end user; raw provider bodies stay in the logs
    fn client_message(err: &HandshakeError) -> String {
        match err {
            HandshakeError::Provider(OAuth1Error::Status { status, body }) => {
                warn!("Provider error body (status {status}): {body}");
                format!("Provider returned status {status}")
            }
            other => other.to_string(),
        }
    }
}

/// Supported HTTP error response types
#[derive(Clone, Copy)]
enum ErrorType {
    BadRequest,
    Unauthorized,
    InternalServerError,
    BadGateway,
}

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
    message: Option<String>,
}

impl ErrorResponseBuilder {
    fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
            message: None,
        }
    }

    /// Set a custom error code (e.g., "`missing_verifier`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// Set a custom error message
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let error_code = self
            .error_code
            .unwrap_or_else(|| self.error_type.default_error_code().to_string());
        let message = self
            .message
            .unwrap_or_else(|| self.error_type.default_message().to_string());

        let mut response = match self.error_type {
            ErrorType::BadRequest => HttpResponse::BadRequest(),
            ErrorType::Unauthorized => HttpResponse::Unauthorized(),
            ErrorType::InternalServerError => HttpResponse::InternalServerError(),
            ErrorType::BadGateway => HttpResponse::BadGateway(),
        };

        response
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(json!({
                "error": error_code,
                "message": message,
            }))
    }
}

impl ErrorType {
    fn default_error_code(self) -> &'static str {
        match self {
            ErrorType::BadRequest => "invalid_request",
            ErrorType::Unauthorized => "unauthorized",
            ErrorType::InternalServerError => "server_error",
            ErrorType::BadGateway => "bad_gateway",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            ErrorType::BadRequest => "The request is malformed or invalid",
            ErrorType::Unauthorized => "Authentication is required to access this resource",
            ErrorType::InternalServerError => "An internal server error occurred",
            ErrorType::BadGateway => "Failed to reach the OAuth1 provider",
        }
    }
}

/// Builder for redirect responses
pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
}

impl RedirectBuilder {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            cookies: Vec::new(),
        }
    }

    /// Add a cookie to the redirect response
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Build the final redirect response
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder
            .append_header((header::LOCATION, self.location))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, http::StatusCode};

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_default_error_body() {
        let response = ResponseBuilder::bad_gateway().build();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_gateway");
        assert_eq!(body["message"], "Failed to reach the OAuth1 provider");
    }

    #[actix_web::test]
    async fn test_handshake_error_status_mapping() {
        let cases = [
            (HandshakeError::MissingVerifier, StatusCode::BAD_REQUEST, "missing_verifier"),
            (HandshakeError::MissingCredentials, StatusCode::UNAUTHORIZED, "missing_credentials"),
            (
                HandshakeError::Provider(OAuth1Error::Network("refused".to_string())),
                StatusCode::BAD_GATEWAY,
                "provider_error",
            ),
            (
                HandshakeError::Provider(OAuth1Error::Configuration("bad url".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "provider_error",
            ),
            (
                HandshakeError::Storage("poisoned".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
            ),
        ];

        for (err, status, code) in cases {
            let response = ResponseBuilder::handshake_error(&err);
            assert_eq!(response.status(), status);
            let body = body_json(response).await;
            assert_eq!(body["error"], code);
            assert_eq!(body["message"], err.to_string());
        }
    }

    #[actix_web::test]
    async fn test_provider_status_body_is_not_rendered() {
        let err = HandshakeError::Provider(OAuth1Error::Status {
            status: 401,
            body: "<html>internal trace id=abc123</html>".to_string(),
        });

        let response = ResponseBuilder::handshake_error(&err);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "provider_error");
        assert_eq!(body["message"], "Provider returned status 401");
        assert!(!body.to_string().contains("abc123"));
    }

    #[test]
    fn test_redirect_sets_location_and_cookie() {
        let response = ResponseBuilder::redirect("https://provider.example/authorize")
            .with_cookie(Cookie::new("latchkey_session", "v"))
            .build();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://provider.example/authorize"
        );
        assert_eq!(response.cookies().count(), 1);
    }
}
