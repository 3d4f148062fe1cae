//! Domain-level error types.

use thiserror::Error;

use crate::ports::GatewayError;

/// Domain errors - input rejected by business rules.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Failures of the generation workflow. All are terminal for the request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i64, available: i64 },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Generated content too short: {words} words, minimum is {minimum}")]
    ContentTooShort { words: i64, minimum: i64 },

    /// The store rejected the deduction and post insert.
    #[error("Failed to persist generation: {0}")]
    Persistence(#[source] RepoError),
}
