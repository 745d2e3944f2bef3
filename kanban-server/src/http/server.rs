//! Axum server setup
//!
//! Server skeleton with:
//! - CORS restricted to configured origins unless permissive mode is on
//! - Tracing middleware
//! - Upload size limit and static media under `/media`
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::auth::TokenService;
use crate::cache::TtlCache;
use crate::config::KanbanConfig;
use crate::db::{self, DbError};
use crate::media::MediaStore;

/// Shared application state
pub struct AppState {
    pub pool: SqlitePool,
    pub tokens: TokenService,
    /// Serialized responses of read endpoints
    pub cache: TtlCache<Value>,
    pub media: MediaStore,
    pub config: KanbanConfig,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: KanbanConfig) -> Self {
        Self {
            pool,
            tokens: TokenService::new(&config.jwt),
            cache: TtlCache::new(config.cache_ttl),
            media: MediaStore::new(config.media_root.clone(), &config.base_site_url),
            config,
        }
    }

    /// Forget cached reads after a successful write.
    pub fn invalidate_reads(&self) {
        self.cache.clear();
    }
}

/// Build the application router with all routes
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    let media = ServeDir::new(state.media.root());

    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::departments::router())
        .merge(routes::employees::router())
        .merge(routes::projects::router())
        .merge(routes::tasks::router())
        .merge(routes::photos::router())
        .nest_service("/media", media)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &KanbanConfig) -> CorsLayer {
    if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Run the HTTP server.
///
/// Opens the pool, applies migrations and serves until a shutdown signal.
///
/// # Example
///
/// ```ignore
/// let config = KanbanConfig::from_env()?;
/// run_server(config).await?;
/// ```
pub async fn run_server(config: KanbanConfig) -> Result<(), ServerError> {
    let pool = db::create_pool_with_options(&config.database_url, config.max_connections)
        .await
        .map_err(DbError::from)?;
    db::migrations::run(&pool).await?;

    tokio::fs::create_dir_all(config.photos_dir()).await?;
    tracing::info!(media_root = %config.media_root.display(), "media directory ready");

    let bind_addr = config.bind_addr;
    let app = build_router(Arc::new(AppState::new(pool, config)));

    // Bind listener
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] DbError),
}
