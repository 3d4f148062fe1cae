//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use forge_core::error::{DomainError, RepoError};
use forge_core::ports::{AuthError, GatewayError};
use forge_core::GenerationError;
use forge_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Conflict(String),
    Internal(String),
    /// Failure of the generation workflow.
    Generation(GenerationError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Generation(err) => write!(f, "{}", err),
        }
    }
}

fn generation_status(err: &GenerationError) -> StatusCode {
    match err {
        GenerationError::Validation(_) => StatusCode::BAD_REQUEST,
        GenerationError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
        GenerationError::ContentTooShort { .. } => StatusCode::BAD_GATEWAY,
        GenerationError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        GenerationError::Gateway(gateway) => match gateway {
            GatewayError::Configuration(_) | GatewayError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            // Mirror the upstream status when it is a real error status.
            GatewayError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        },
    }
}

fn generation_problem(err: &GenerationError, status: StatusCode) -> ErrorResponse {
    let code = status.as_u16();
    match err {
        GenerationError::Validation(msg) => ErrorResponse::bad_request(msg),
        GenerationError::InsufficientCredits { .. } => {
            ErrorResponse::payment_required(err.to_string())
        }
        GenerationError::ContentTooShort { .. } => ErrorResponse::new(code, "Content Too Short")
            .with_type("content-too-short")
            .with_detail(err.to_string()),
        GenerationError::Persistence(_) => ErrorResponse::new(code, "Internal Server Error")
            .with_type("persistence-failure")
            .with_detail("Failed to save generated content"),
        GenerationError::Gateway(gateway) => match gateway {
            GatewayError::Configuration(msg) => {
                tracing::error!(error = %msg, "Generation gateway misconfigured");
                ErrorResponse::new(code, "Generation Service Misconfigured")
                    .with_type("gateway-configuration")
                    .with_detail(msg)
            }
            GatewayError::RateLimited { message, .. } => {
                ErrorResponse::new(code, "Generation Service Rate Limited")
                    .with_type("gateway-rate-limited")
                    .with_detail(message)
            }
            GatewayError::Upstream {
                message,
                error_type,
                ..
            } => ErrorResponse::new(code, "Generation Service Error")
                .with_type("gateway-error")
                .with_detail(message)
                .with_upstream_type(error_type.clone()),
            GatewayError::Transport(msg) => ErrorResponse::new(code, "Generation Service Unavailable")
                .with_type("gateway-unavailable")
                .with_detail(msg),
            GatewayError::MalformedResponse(msg) => {
                ErrorResponse::new(code, "Invalid Generation Response")
                    .with_type("gateway-malformed-response")
                    .with_detail(msg)
            }
        },
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Generation(err) => generation_status(err),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized(),
            AppError::Conflict(detail) => ErrorResponse::new(409, "Conflict").with_detail(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Generation(err) => generation_problem(err, status),
        };

        let mut response = HttpResponse::build(status);
        if let AppError::Generation(GenerationError::Gateway(GatewayError::RateLimited {
            retry_after_secs: Some(secs),
            ..
        })) = self
        {
            response.insert_header((header::RETRY_AFTER, secs.to_string()));
        }
        response.json(error)
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        AppError::Generation(err)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::BadRequest(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::MissingAuth => AppError::Unauthorized,
            AuthError::HashingError(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
