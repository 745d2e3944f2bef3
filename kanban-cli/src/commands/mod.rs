//! Subcommand implementations

pub mod migrate;
pub mod serve;
pub mod user;

use anyhow::{Context, Result};
use kanban_server::db::{create_pool, migrations};
use sqlx::SqlitePool;

/// Open the database and bring its schema up to date.
pub(crate) async fn open_database(database_url: &str) -> Result<SqlitePool> {
    let pool = create_pool(database_url)
        .await
        .with_context(|| format!("Failed to open database {database_url}"))?;
    migrations::run(&pool)
        .await
        .context("Failed to apply migrations")?;
    Ok(pool)
}
