//! Liveness and database readiness
//!
//! Unauthenticated. Answers 503 while the pool cannot run a query so a load
//! balancer stops routing to an instance that lost its database.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::http::server::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: &'static str,
    pub version: &'static str,
    /// "up" or "down"
    pub database: &'static str,
}

impl HealthResponse {
    /// Ping the database and describe the result.
    pub async fn check(pool: &SqlitePool) -> Self {
        let database_up = match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "health check: database unreachable");
                false
            }
        };
        Self {
            status: if database_up { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database: if database_up { "up" } else { "down" },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        if self.database == "up" {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let report = HealthResponse::check(&state.pool).await;
    (report.status_code(), Json(report))
}

/// Health routes (no auth)
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    #[tokio::test]
    async fn health_reports_version_and_database() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let report = HealthResponse::check(&pool).await;
        assert_eq!(report.status, "ok");
        assert_eq!(report.database, "up");
        assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(report.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn closed_pool_is_degraded() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        pool.close().await;

        let report = HealthResponse::check(&pool).await;
        assert_eq!(report.status, "degraded");
        assert_eq!(report.database, "down");
        assert_eq!(report.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
