//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub timestamp: String,
}

/// GET /api/health
///
/// Reports `degraded` with a 503 when the database stops answering.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = state.storage_reachable().await;
    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    if healthy {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
