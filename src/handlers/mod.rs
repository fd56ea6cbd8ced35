// HTTP request handlers for the OAuth1 handshake
pub mod health;
pub mod oauth1;

use actix_web::web;

pub use health::health;
pub use oauth1::{oauth1_callback, oauth1_sign_in, HandshakeServices};

/// Register the handshake and health routes
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/oauth1/sign_in", web::get().to(oauth1_sign_in))
        .route("/auth/oauth1/callback", web::get().to(oauth1_callback))
        .route("/auth/oauth1/callback", web::post().to(oauth1_callback))
        .route("/ping", web::get().to(health));
}
