#[cfg(feature = "postgres")]
use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

/// Configuration for the primary database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Connection pool for the primary database.
///
/// Accounts and posts live in the same database so a generation can deduct
/// credits and insert its post in one transaction.
#[cfg(feature = "postgres")]
pub struct DatabaseConnections {
    pub main: DbConn,
}

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// Open the connection pool described by `config`.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connections...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(true)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!(
            "Main database connected (pool: {})",
            config.max_connections
        );

        Ok(Self { main })
    }

    /// Round-trip a trivial statement to confirm the pool is usable.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.main.ping().await
    }
}
