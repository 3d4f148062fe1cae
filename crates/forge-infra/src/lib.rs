//! # Forge Infrastructure
//!
//! Concrete implementations of the ports defined in `forge-core`:
//! persistence, the text-generation gateway, authentication and rate limiting.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory store only
//! - `postgres` - PostgreSQL persistence via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Rate limiting via governor

pub mod database;
pub mod generation;
mod redact;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use database::{
    DatabaseConfig, InMemoryAccountRepository, InMemoryPostRepository, InMemoryStore,
};
pub use generation::{GatewayConfig, ResponsesGateway};
pub use redact::mask_email;

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConnections, PostgresAccountRepository, PostgresGenerationStore,
    PostgresPostRepository,
};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
