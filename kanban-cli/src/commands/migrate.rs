//! Schema migration command

use anyhow::Result;
use clap::Parser;

use kanban_server::config::DEFAULT_DATABASE_URL;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let pool = super::open_database(&args.database_url).await?;
    pool.close().await;

    println!("Schema is up to date ({})", args.database_url);
    Ok(())
}
