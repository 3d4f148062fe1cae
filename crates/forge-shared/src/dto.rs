//! Data Transfer Objects - request/response types for the API.
//!
//! Responses use camelCase keys, the casing the browser client reads.

use serde::{Deserialize, Serialize};

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// An account's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub credits: i64,
    pub role: String,
    pub created_at: String,
}

/// Response containing an access token and the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: AccountResponse,
}

/// Request to top up an account's credits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCreditsRequest {
    pub amount: i64,
}

/// Balance after a top-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalanceResponse {
    pub message: String,
    pub new_balance: i64,
    pub added: i64,
}

/// Request to generate a post from a prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Result of a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub post: PostResponse,
    pub credits_left: i64,
    pub usage: serde_json::Value,
    pub cost: i64,
}

/// Request to create a post by hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// Partial update of a post. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// A post as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    /// Same value as `id`, for clients that key posts by `_id`.
    #[serde(rename = "_id")]
    pub legacy_id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub category: String,
    pub tags: Vec<String>,
    pub word_count: i64,
    pub prompt: Option<String>,
    pub model_used: Option<String>,
    pub tokens_used: Option<i64>,
    pub visibility: String,
    pub created_at: String,
    pub updated_at: String,
}
