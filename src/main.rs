#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use latchkey::{
    handlers::{configure_services, HandshakeServices},
    settings::LatchkeySettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = LatchkeySettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let services = HandshakeServices::from_settings(&settings)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize OAuth1 provider: {e}")))?;

    start_server(services, settings).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(services: HandshakeServices, settings: LatchkeySettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let cors_origins = settings.get_cors_origins();
    let services = web::Data::new(services);

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(services.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &LatchkeySettings) {
    let provider = settings
        .provider
        .display_name
        .as_deref()
        .unwrap_or(&settings.provider.name);

    println!("Starting Latchkey OAuth1 gateway on http://{bind_address}");
    println!("Provider: {provider} ({})", settings.provider.signature_method);
    println!("Handshake mode: {}", settings.handshake_mode());
    println!();
    println!("OAuth1 endpoints:");
    println!("  GET  /auth/oauth1/sign_in    - Begin handshake");
    println!("  GET|POST /auth/oauth1/callback - Complete handshake");
    println!();
    println!("OAuth1 callback URL to register with the provider:");
    println!("  {}", settings.callback_uri());
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
}
