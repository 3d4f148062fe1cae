//! Cross-origin policy for the browser client.

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};

use crate::observability::REQUEST_ID_HEADER;

/// Build the CORS middleware for `allowed_origins`.
///
/// Credentials are allowed, so a `*` entry is skipped rather than widening the
/// policy to every origin. Requests without an `Origin` header are not affected.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let base = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers(vec![
            header::RETRY_AFTER,
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static("x-ratelimit-remaining"),
        ])
        .supports_credentials()
        .max_age(3600);

    allowed_origins
        .iter()
        .filter(|origin| {
            if origin.as_str() == "*" {
                tracing::warn!("Ignoring wildcard CORS origin; list origins explicitly");
                return false;
            }
            true
        })
        .fold(base, |cors, origin| cors.allowed_origin(origin))
}
