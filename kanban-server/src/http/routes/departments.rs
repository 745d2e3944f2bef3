//! Department endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::Value;

use super::{cached, success};
use crate::db::{Department, DepartmentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, Page, ValidUuid};
use crate::http::permissions::{RequireModerator, RequireUser};
use crate::http::server::AppState;
use crate::models::Title;

#[derive(Deserialize)]
pub struct CreateDepartmentRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateDepartmentRequest {
    pub title: Option<String>,
}

/// GET /departments
async fn list_departments(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    Page(page): Page,
) -> Result<Json<Value>, ApiError> {
    let key = format!("departments:{}", page.cache_key());
    cached(&state, key, DepartmentRepo::new(&state.pool).crud().list(page)).await
}

/// GET /departments/{id} - with employees
async fn get_department(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    let key = format!("departments:{id}");
    cached(&state, key, DepartmentRepo::new(&state.pool).with_employees(id)).await
}

/// POST /departments
async fn create_department(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    JsonBody(req): JsonBody<CreateDepartmentRequest>,
) -> Result<Json<Department>, ApiError> {
    let title = Title::new(&req.title)?;
    let department = DepartmentRepo::new(&state.pool).create(&title).await?;
    state.invalidate_reads();
    Ok(Json(department))
}

/// PATCH /departments/{id}
async fn update_department(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateDepartmentRequest>,
) -> Result<Json<Department>, ApiError> {
    let title = req.title.as_deref().map(Title::new).transpose()?;
    let department = DepartmentRepo::new(&state.pool)
        .update(id, title.as_ref())
        .await?;
    state.invalidate_reads();
    Ok(Json(department))
}

/// DELETE /departments/{id} - refused while employees remain
async fn delete_department(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    DepartmentRepo::new(&state.pool).crud().delete(id).await?;
    state.invalidate_reads();
    Ok(success())
}

/// Department routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route(
            "/departments/{id}",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
}
