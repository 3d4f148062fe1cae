//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod generation;
mod rate_limit;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use generation::{Completion, CompletionRequest, GatewayError, SamplingParams, TextGenerator};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    AccountRepository, BaseRepository, CommittedGeneration, GenerationStore, POST_LIST_LIMIT,
    PostRepository,
};
