//! Migration CLI tool. Reads `DATABASE_URL` and applies the Forge schema.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info,sea_orm_migration=info")
        .init();

    tracing::info!("Running Forge migrations");
    cli::run_cli(migration::Migrator).await;
}
