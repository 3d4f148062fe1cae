//! Content generation handler.

use actix_web::{HttpResponse, web};

use forge_core::domain::{Category, GenerationRequest};
use forge_shared::dto::{GenerateRequest, GenerateResponse};

use super::posts::post_response;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/generate
///
/// Runs the full workflow for the caller: balance pre-check, upstream call,
/// billing by actual word count and persistence of the new post.
pub async fn generate(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<GenerateRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let account = identity.account(&state).await?;

    let mut request = GenerationRequest::new(req.prompt).with_category(
        req.category
            .as_deref()
            .map(Category::from_tag)
            .unwrap_or_default(),
    );
    if let Some(title) = req.title {
        request = request.with_title(title);
    }
    if let Some(model) = req.model.filter(|m| !m.trim().is_empty()) {
        request = request.with_model(model);
    }

    let outcome = state.generation.generate(&account, request).await?;

    Ok(HttpResponse::Ok().json(GenerateResponse {
        post: post_response(&outcome.post),
        credits_left: outcome.credits_remaining,
        usage: outcome.usage,
        cost: outcome.cost,
    }))
}
