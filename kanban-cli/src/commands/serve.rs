//! HTTP server command
//!
//! Loads the configuration from the environment, applies CLI overrides and
//! runs the API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use kanban_server::{run_server, KanbanConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[arg(long, short = 'b', env = "BIND_ADDR")]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = KanbanConfig::from_env()
        .context("Invalid configuration. Set JWT_SECRET_KEY via environment or .env")?;

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    config.cors_permissive |= args.cors_permissive;

    tracing::info!("Starting kanban server on {}", config.bind_addr);

    // Blocks until shutdown
    run_server(config).await.context("Server error")?;

    Ok(())
}
