use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, Post};
use crate::error::RepoError;

/// Most posts returned by a single listing.
pub const POST_LIST_LIMIT: u64 = 100;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Account repository with domain-specific methods.
#[async_trait]
pub trait AccountRepository: BaseRepository<Account, Uuid> {
    /// Find an account by its normalized email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError>;

    /// Atomically add `amount` credits and return the updated account.
    async fn add_credits(&self, id: Uuid, amount: i64) -> Result<Account, RepoError>;
}

/// Post repository. Every lookup is scoped to the owning account.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Posts owned by `user_id`, newest first, at most `limit`.
    async fn find_by_user_id(&self, user_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// A single post, only if `user_id` owns it.
    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Delete a post owned by `user_id`. `RepoError::NotFound` otherwise.
    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<(), RepoError>;
}

/// Result of committing a generation.
#[derive(Debug, Clone)]
pub struct CommittedGeneration {
    pub post: Post,
    pub credits_remaining: i64,
}

/// Writes the outcome of a generation as one atomic unit.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Deduct `cost` from the owner's balance (floored at zero) and insert `post`.
    /// Either both writes happen or neither does.
    async fn commit_generation(
        &self,
        post: Post,
        cost: i64,
    ) -> Result<CommittedGeneration, RepoError>;
}
