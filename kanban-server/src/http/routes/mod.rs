//! HTTP route handlers

use std::future::Future;

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::server::AppState;
use crate::db::DbError;

pub mod auth;
pub mod departments;
pub mod employees;
pub mod health;
pub mod photos;
pub mod projects;
pub mod tasks;
pub mod users;

/// Body returned by deletes
pub(crate) fn success() -> Json<Value> {
    Json(json!({ "detail": "success" }))
}

/// Serve `key` from the read cache, loading and storing it on a miss.
pub(crate) async fn cached<T, F>(state: &AppState, key: String, load: F) -> Result<Json<Value>, ApiError>
where
    T: Serialize,
    F: Future<Output = Result<T, DbError>>,
{
    if let Some(hit) = state.cache.get(&key) {
        tracing::trace!(%key, "cache hit");
        return Ok(Json(hit));
    }

    let generation = state.cache.generation();
    let value = serde_json::to_value(load.await?)?;
    if !state.cache.insert_if_current(key.clone(), value.clone(), generation) {
        tracing::trace!(%key, "write landed during load, result not cached");
    }
    Ok(Json(value))
}
