//! kanban CLI - run and administer the Kanban task manager
//!
//! - `serve`: run the HTTP API
//! - `migrate`: create or update the database schema
//! - `user`: create accounts and grant roles without going through the API

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "kanban",
    author,
    version,
    about = "Kanban task manager: HTTP API server and account administration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply database schema migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Manage accounts (create, grant)
    User(commands::user::UserArgs),
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply
    dotenvy::dotenv().ok();
    init_tracing().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args).await?,
        Commands::Migrate(args) => commands::migrate::run_migrate(args).await?,
        Commands::User(args) => commands::user::run_user(args).await?,
    }

    Ok(())
}
