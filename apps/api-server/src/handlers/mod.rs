//! HTTP handlers and route configuration.

mod auth;
mod generate;
mod health;
mod posts;

use std::sync::Arc;

use actix_web::web;
use forge_core::ports::RateLimiter;

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes. `limiter` guards the generation endpoint.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: Arc<dyn RateLimiter>) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me))
                    .route("/add-credits", web::post().to(auth::add_credits)),
            )
            .service(
                web::resource("/generate")
                    .wrap(RateLimitMiddleware::new(limiter))
                    .route(web::post().to(generate::generate)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post)),
            ),
    );
}
