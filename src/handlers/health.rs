use actix_web::{HttpResponse, Result};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    message: String,
}

/// Health check endpoint
///
/// # Errors
///
/// This function does not return errors but uses Result for consistency with other handlers
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Latchkey OAuth1 gateway is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
