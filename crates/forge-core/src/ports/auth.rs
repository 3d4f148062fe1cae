//! Authentication and authorization ports.

use uuid::Uuid;

/// Claims carried by access tokens.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub account_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: i64,
}

/// Token service trait for JWT operations.
pub trait TokenService: Send + Sync {
    /// Issue an access token for an account.
    fn generate_token(
        &self,
        account_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),
}
