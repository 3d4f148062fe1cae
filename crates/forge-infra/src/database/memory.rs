//! In-memory store - used when no database is configured, and in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use forge_core::domain::{Account, Post};
use forge_core::error::RepoError;
use forge_core::ports::{
    AccountRepository, BaseRepository, CommittedGeneration, GenerationStore, PostRepository,
};
use forge_core::services::ledger;

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    posts: HashMap<Uuid, Post>,
}

/// Shared in-memory tables behind one lock.
///
/// A single lock guards both tables, so a generation commit is atomic with
/// respect to every other operation. Data is lost on process restart.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts(&self) -> InMemoryAccountRepository {
        InMemoryAccountRepository {
            store: self.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            store: self.clone(),
        }
    }
}

/// Account repository over an [`InMemoryStore`].
#[derive(Clone)]
pub struct InMemoryAccountRepository {
    store: InMemoryStore,
}

/// Post repository over an [`InMemoryStore`].
#[derive(Clone)]
pub struct InMemoryPostRepository {
    store: InMemoryStore,
}

#[async_trait]
impl BaseRepository<Account, Uuid> for InMemoryAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.accounts.get(&id).cloned())
    }

    async fn save(&self, account: Account) -> Result<Account, RepoError> {
        let mut tables = self.store.tables.write().await;

        let email_taken = tables
            .accounts
            .values()
            .any(|a| a.email == account.email && a.id != account.id);
        if email_taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.accounts.remove(&id).ok_or(RepoError::NotFound)?;
        tables.posts.retain(|_, p| p.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError> {
        let email = Account::normalize_email(email);
        let tables = self.store.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn add_credits(&self, id: Uuid, amount: i64) -> Result<Account, RepoError> {
        let mut tables = self.store.tables.write().await;
        let account = tables.accounts.get_mut(&id).ok_or(RepoError::NotFound)?;

        account.credits = account.credits.saturating_add(amount).max(0);
        account.updated_at = Utc::now();
        Ok(account.clone())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.accounts.contains_key(&post.user_id) {
            return Err(RepoError::Constraint("Owner does not exist".to_string()));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.posts.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_user_id(&self, user_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .posts
            .get(&id)
            .filter(|p| p.user_id == user_id)
            .cloned())
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        let owned = tables
            .posts
            .get(&id)
            .is_some_and(|p| p.user_id == user_id);
        if !owned {
            return Err(RepoError::NotFound);
        }

        tables.posts.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl GenerationStore for InMemoryStore {
    async fn commit_generation(
        &self,
        post: Post,
        cost: i64,
    ) -> Result<CommittedGeneration, RepoError> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(&post.user_id)
            .ok_or(RepoError::NotFound)?;

        account.credits = ledger::apply_deduction(account.credits, cost);
        account.updated_at = Utc::now();
        let credits_remaining = account.credits;

        tables.posts.insert(post.id, post.clone());

        Ok(CommittedGeneration {
            post,
            credits_remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::domain::Category;

    async fn seeded() -> (InMemoryStore, Account) {
        let store = InMemoryStore::new();
        let account = Account::new(None, "owner@example.com", "hash".to_string(), 10);
        store.accounts().save(account.clone()).await.unwrap();
        (store, account)
    }

    fn post_for(owner: Uuid, title: &str) -> Post {
        Post::new(
            owner,
            title.to_string(),
            "some body text".to_string(),
            Category::Blog,
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_constraint_violation() {
        let (store, _) = seeded().await;
        let twin = Account::new(None, "OWNER@example.com", "hash".to_string(), 10);

        let result = store.accounts().save(twin).await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_find_by_email_normalizes_input() {
        let (store, account) = seeded().await;

        let found = store
            .accounts()
            .find_by_email(" Owner@Example.com")
            .await
            .unwrap();

        assert_eq!(found.map(|a| a.id), Some(account.id));
    }

    #[tokio::test]
    async fn test_add_credits() {
        let (store, account) = seeded().await;

        let updated = store.accounts().add_credits(account.id, 15).await.unwrap();

        assert_eq!(updated.credits, 25);
        assert!(matches!(
            store.accounts().add_credits(Uuid::new_v4(), 1).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_commit_generation_deducts_and_inserts() {
        let (store, account) = seeded().await;

        let committed = store
            .commit_generation(post_for(account.id, "Generated"), 3)
            .await
            .unwrap();

        assert_eq!(committed.credits_remaining, 7);
        let stored = store.accounts().find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.credits, 7);
        assert!(
            store
                .posts()
                .find_owned(committed.post.id, account.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_commit_generation_floors_balance_at_zero() {
        let (store, account) = seeded().await;

        let committed = store
            .commit_generation(post_for(account.id, "Big"), 50)
            .await
            .unwrap();

        assert_eq!(committed.credits_remaining, 0);
    }

    #[tokio::test]
    async fn test_commit_for_unknown_owner_writes_nothing() {
        let store = InMemoryStore::new();
        let orphan = post_for(Uuid::new_v4(), "Orphan");

        let result = store.commit_generation(orphan.clone(), 1).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
        assert!(store.posts().find_by_id(orphan.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_commits_do_not_lose_deductions() {
        let (store, account) = seeded().await;

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let store = store.clone();
                let post = post_for(account.id, &format!("Post {i}"));
                tokio::spawn(async move { store.commit_generation(post, 2).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.accounts().find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.credits, 0);
        assert_eq!(
            store
                .posts()
                .find_by_user_id(account.id, 100)
                .await
                .unwrap()
                .len(),
            5
        );
    }

    #[tokio::test]
    async fn test_posts_are_scoped_to_owner() {
        let (store, owner) = seeded().await;
        let intruder = Account::new(None, "intruder@example.com", "hash".to_string(), 10);
        store.accounts().save(intruder.clone()).await.unwrap();
        let post = store
            .posts()
            .save(post_for(owner.id, "Mine"))
            .await
            .unwrap();

        let posts = store.posts();
        assert!(posts.find_owned(post.id, intruder.id).await.unwrap().is_none());
        assert!(posts.find_by_user_id(intruder.id, 100).await.unwrap().is_empty());
        assert!(matches!(
            posts.delete_owned(post.id, intruder.id).await,
            Err(RepoError::NotFound)
        ));
        assert!(posts.find_owned(post.id, owner.id).await.unwrap().is_some());

        posts.delete_owned(post.id, owner.id).await.unwrap();
        assert!(posts.find_owned(post.id, owner.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_and_limited() {
        let (store, owner) = seeded().await;
        let posts = store.posts();
        for i in 0..3 {
            let mut post = post_for(owner.id, &format!("Post {i}"));
            post.created_at = post.created_at + chrono::TimeDelta::seconds(i);
            posts.save(post).await.unwrap();
        }

        let listed = posts.find_by_user_id(owner.id, 2).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Post 2");
        assert_eq!(listed[1].title, "Post 1");
    }
}
