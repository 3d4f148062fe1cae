//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use forge_core::domain::{Account, Post};
use forge_core::error::RepoError;
use forge_core::ports::{AccountRepository, CommittedGeneration, GenerationStore, PostRepository};

use super::entity::account::{self, Entity as AccountEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};
use crate::mask_email;

/// PostgreSQL account repository.
pub type PostgresAccountRepository = PostgresBaseRepository<AccountEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding account by email");

        let result = AccountEntity::find()
            .filter(account::Column::Email.eq(Account::normalize_email(email)))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn add_credits(&self, id: Uuid, amount: i64) -> Result<Account, RepoError> {
        let result = AccountEntity::update_many()
            .col_expr(
                account::Column::Credits,
                Expr::col(account::Column::Credits).add(amount),
            )
            .col_expr(account::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(account::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        AccountEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(Into::into)
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_user_id(&self, user_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .filter(post::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_many()
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

/// Commits generations inside a single database transaction.
pub struct PostgresGenerationStore {
    db: DbConn,
}

impl PostgresGenerationStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GenerationStore for PostgresGenerationStore {
    async fn commit_generation(
        &self,
        post: Post,
        cost: i64,
    ) -> Result<CommittedGeneration, RepoError> {
        let owner = post.user_id;
        let txn = self.db.begin().await.map_err(map_db_err)?;

        // Single-statement decrement keeps concurrent deductions from losing writes.
        let updated = AccountEntity::update_many()
            .col_expr(
                account::Column::Credits,
                Expr::cust_with_values("GREATEST(\"credits\" - $1, 0)", [cost]),
            )
            .col_expr(account::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(account::Column::Id.eq(owner))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if updated.rows_affected == 0 {
            // Dropping the transaction rolls it back.
            return Err(RepoError::NotFound);
        }

        let credits_remaining = AccountEntity::find_by_id(owner)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .map(|a| a.credits)
            .ok_or(RepoError::NotFound)?;

        let saved = post::ActiveModel::from(post)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;

        Ok(CommittedGeneration {
            post: saved.into(),
            credits_remaining,
        })
    }
}
