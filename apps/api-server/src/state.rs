//! Application state - shared across all handlers.

use std::sync::Arc;

use forge_core::ports::{AccountRepository, GenerationStore, PostRepository, TextGenerator};
use forge_core::services::{CreditPolicy, GenerationService};
use forge_infra::database::{DatabaseConfig, InMemoryStore};

#[cfg(feature = "postgres")]
use forge_infra::database::{
    DatabaseConnections, PostgresAccountRepository, PostgresGenerationStore,
    PostgresPostRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub generation: Arc<GenerationService>,
    pub credits: CreditPolicy,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state, falling back to the in-memory store when
    /// no database is configured or reachable.
    pub async fn new(
        db_config: Option<&DatabaseConfig>,
        generator: Arc<dyn TextGenerator>,
        credits: CreditPolicy,
    ) -> Self {
        if let Some(state) = Self::connect(db_config, generator.clone(), credits).await {
            tracing::info!("Application state initialized (postgres)");
            return state;
        }

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory(InMemoryStore::new(), generator, credits)
    }

    #[cfg(feature = "postgres")]
    async fn connect(
        db_config: Option<&DatabaseConfig>,
        generator: Arc<dyn TextGenerator>,
        credits: CreditPolicy,
    ) -> Option<Self> {
        let connections = match DatabaseConnections::init(db_config?).await {
            Ok(connections) => Arc::new(connections),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                return None;
            }
        };

        let db = connections.main.clone();
        let store = Arc::new(PostgresGenerationStore::new(db.clone()));
        Some(Self {
            accounts: Arc::new(PostgresAccountRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db)),
            generation: Arc::new(GenerationService::new(generator, store, credits)),
            credits,
            db: Some(connections),
        })
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect(
        db_config: Option<&DatabaseConfig>,
        _generator: Arc<dyn TextGenerator>,
        _credits: CreditPolicy,
    ) -> Option<Self> {
        if db_config.is_some() {
            tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
        }
        None
    }

    /// State backed entirely by `store`.
    pub fn in_memory(
        store: InMemoryStore,
        generator: Arc<dyn TextGenerator>,
        credits: CreditPolicy,
    ) -> Self {
        let generation_store: Arc<dyn GenerationStore> = Arc::new(store.clone());
        Self {
            accounts: Arc::new(store.accounts()),
            posts: Arc::new(store.posts()),
            generation: Arc::new(GenerationService::new(generator, generation_store, credits)),
            credits,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    /// Name of the backing store, for health reporting.
    #[cfg(feature = "postgres")]
    pub fn storage(&self) -> &'static str {
        if self.db.is_some() { "postgres" } else { "memory" }
    }

    #[cfg(not(feature = "postgres"))]
    pub fn storage(&self) -> &'static str {
        "memory"
    }

    /// Whether the backing store answers. The in-memory store always does.
    #[cfg(feature = "postgres")]
    pub async fn storage_reachable(&self) -> bool {
        match &self.db {
            Some(db) => db
                .ping()
                .await
                .inspect_err(|e| tracing::warn!(error = %e, "Database ping failed"))
                .is_ok(),
            None => true,
        }
    }

    #[cfg(not(feature = "postgres"))]
    pub async fn storage_reachable(&self) -> bool {
        true
    }
}
