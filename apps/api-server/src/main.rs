//! # Forge API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use forge_core::ports::{PasswordService, RateLimiter, TextGenerator, TokenService};
use forge_infra::{
    Argon2PasswordService, InMemoryRateLimiter, JwtTokenService, ResponsesGateway,
};

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);
    config.log_warnings();
    config.validate().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    tracing::info!(
        "Starting Forge API Server on {}:{}",
        config.host,
        config.port
    );

    let generator: Arc<dyn TextGenerator> = Arc::new(
        ResponsesGateway::new(config.gateway.clone())
            .map_err(|e| io::Error::other(e.to_string()))?,
    );
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
    let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
    let limiter: Arc<dyn RateLimiter> = Arc::new(
        InMemoryRateLimiter::new(config.rate_limit.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?,
    );

    let state = AppState::new(config.database.as_ref(), generator, config.credits).await;
    let cors_origins = config.cors_allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(middleware::cors::cors(&cors_origins))
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(tokens.clone()))
            .app_data(web::Data::new(passwords.clone()))
            .configure(|cfg| handlers::configure_routes(cfg, limiter.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
