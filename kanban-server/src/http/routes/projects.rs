//! Project endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::Value;

use super::{cached, success};
use crate::db::{Project, ProjectChanges, ProjectRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, Page, ValidUuid};
use crate::http::permissions::{RequireModerator, RequireUser};
use crate::http::server::AppState;
use crate::models::Title;

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// GET /projects - active projects
async fn list_projects(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    Page(page): Page,
) -> Result<Json<Value>, ApiError> {
    let key = format!("projects:{}", page.cache_key());
    cached(&state, key, ProjectRepo::new(&state.pool).crud().list_active(page)).await
}

/// GET /projects/{id} - with active tasks
async fn get_project(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    let key = format!("projects:{id}");
    cached(&state, key, ProjectRepo::new(&state.pool).detail(id)).await
}

/// POST /projects
async fn create_project(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    JsonBody(req): JsonBody<CreateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let title = Title::new(&req.title)?;
    let project = ProjectRepo::new(&state.pool)
        .create(title, req.description)
        .await?;
    state.invalidate_reads();
    Ok(Json(project))
}

/// PATCH /projects/{id}
async fn update_project(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let changes = ProjectChanges {
        title: req.title.as_deref().map(Title::new).transpose()?,
        description: req.description,
    };
    let project = ProjectRepo::new(&state.pool).update(id, changes).await?;
    state.invalidate_reads();
    Ok(Json(project))
}

/// DELETE /projects/{id} - deactivates
async fn delete_project(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    ProjectRepo::new(&state.pool).crud().deactivate(id).await?;
    state.invalidate_reads();
    Ok(success())
}

/// Project routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
}
