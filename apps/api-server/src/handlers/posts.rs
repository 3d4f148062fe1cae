//! Post handlers. Every query is scoped to the caller's account.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use forge_core::domain::{Category, Post, PostEdit, Visibility};
use forge_core::ports::{BaseRepository, POST_LIST_LIMIT, PostRepository};
use forge_core::services::derive_title;
use forge_shared::ApiResponse;
use forge_shared::dto::{CreatePostRequest, PostResponse, UpdatePostRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(crate) fn post_response(post: &Post) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        legacy_id: post.id.to_string(),
        user_id: post.user_id.to_string(),
        title: post.title.clone(),
        body: post.body.clone(),
        category: post.category.as_str().to_string(),
        tags: post.tags.clone(),
        word_count: post.word_count,
        prompt: post.prompt.clone(),
        model_used: post.model_used.clone(),
        tokens_used: post.tokens_used,
        visibility: post.visibility.as_str().to_string(),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn ensure_body(body: &str) -> AppResult<()> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest("Body is required".to_string()));
    }
    Ok(())
}

fn not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

/// GET /api/posts
pub async fn list_posts(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let account = identity.account(&state).await?;
    let posts = state
        .posts
        .find_by_user_id(account.id, POST_LIST_LIMIT)
        .await?;

    let body: Vec<PostResponse> = posts.iter().map(post_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let account = identity.account(&state).await?;
    let post = state
        .posts
        .find_owned(path.into_inner(), account.id)
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(post_response(&post)))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    ensure_body(&req.body)?;

    let account = identity.account(&state).await?;
    let category = req
        .category
        .as_deref()
        .map(Category::from_tag)
        .unwrap_or_default();
    let visibility = req
        .visibility
        .as_deref()
        .map(Visibility::from_tag)
        .unwrap_or_default();

    let post = Post::new(
        account.id,
        derive_title(req.title.as_deref(), &req.body),
        req.body,
        category,
    )
    .with_tags(clean_tags(req.tags))
    .with_visibility(visibility);

    let saved = state.posts.save(post).await?;
    tracing::info!(post_id = %saved.id, account_id = %account.id, "Post created");

    Ok(HttpResponse::Created().json(post_response(&saved)))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    if let Some(body) = &req.body {
        ensure_body(body)?;
    }
    let account = identity.account(&state).await?;
    let mut post = state
        .posts
        .find_owned(path.into_inner(), account.id)
        .await?
        .ok_or_else(not_found)?;

    post.apply(PostEdit {
        title: req.title.filter(|t| !t.trim().is_empty()),
        body: req.body,
        category: req.category.as_deref().map(Category::from_tag),
        tags: req.tags.map(clean_tags),
        visibility: req.visibility.as_deref().map(Visibility::from_tag),
    });

    let saved = state.posts.save(post).await?;
    Ok(HttpResponse::Ok().json(post_response(&saved)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let account = identity.account(&state).await?;
    let id = path.into_inner();

    state
        .posts
        .delete_owned(id, account.id)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::NotFound(_) => not_found(),
            other => other,
        })?;

    tracing::info!(post_id = %id, account_id = %account.id, "Post deleted");
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::message_only("Post deleted")))
}
