//! Authentication extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header};
use std::future::{Ready, ready};
use std::sync::Arc;

use forge_core::domain::Account;
use forge_core::ports::{AuthError, BaseRepository, TokenClaims, TokenService};
use forge_infra::mask_email;
use forge_shared::ErrorResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticated caller, decoded from a Bearer token.
///
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, account {}!", identity.account_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub account_id: uuid::Uuid,
    pub email: String,
}

impl Identity {
    /// Load the account behind this identity.
    ///
    /// A valid token for an account that no longer exists is treated as
    /// unauthenticated.
    pub async fn account(&self, state: &AppState) -> AppResult<Account> {
        let account = state.accounts.find_by_id(self.account_id).await?;
        account.ok_or_else(|| {
            tracing::warn!(
                account_id = %self.account_id,
                email = %mask_email(&self.email),
                "Token refers to a missing account"
            );
            AppError::Unauthorized
        })
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            account_id: claims.account_id,
            email: claims.email,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingAuth => {
                actix_web::http::StatusCode::UNAUTHORIZED
            }
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            _ => ErrorResponse::internal_error(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identify(req))
    }
}

fn identify(req: &HttpRequest) -> Result<Identity, AuthenticationError> {
    let Some(token_service) = req.app_data::<actix_web::web::Data<Arc<dyn TokenService>>>()
    else {
        tracing::error!("TokenService not found in app data");
        return Err(AuthenticationError(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        )));
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthenticationError(AuthError::MissingAuth))?;

    let auth_str = auth_header.to_str().map_err(|_| {
        AuthenticationError(AuthError::InvalidToken(
            "Invalid authorization header".to_string(),
        ))
    })?;

    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        AuthenticationError(AuthError::InvalidToken("Expected Bearer token".to_string()))
    })?;

    token_service
        .validate_token(token.trim())
        .map(Identity::from)
        .map_err(AuthenticationError)
}
