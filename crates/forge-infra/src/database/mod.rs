//! Persistence: SeaORM-backed Postgres repositories and an in-memory store.

mod memory;

mod connections;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use memory::{InMemoryAccountRepository, InMemoryPostRepository, InMemoryStore};

pub use connections::DatabaseConfig;
#[cfg(feature = "postgres")]
pub use connections::DatabaseConnections;
#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresAccountRepository, PostgresGenerationStore, PostgresPostRepository,
};
