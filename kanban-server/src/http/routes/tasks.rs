//! Task endpoints
//!
//! Any member may create tasks. Only the author (or a moderator) may change
//! or delete one.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{cached, success};
use crate::db::{EmployeeRepo, NewTask, Task, TaskChanges, TaskRepo, User};
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, Page, ValidUuid};
use crate::http::permissions::{ensure_task_owner, RequireUser};
use crate::http::server::AppState;
use crate::models::{check_schedule, TaskPriority, TaskStatus, Title};

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub projects: Vec<Uuid>,
    #[serde(default)]
    pub employees: Vec<Uuid>,
    /// Defaults to the caller's employee profile
    pub author_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub projects: Option<Vec<Uuid>>,
    pub employees: Option<Vec<Uuid>>,
    pub author_id: Option<Uuid>,
}

/// GET /tasks - active tasks with projects and assignees
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    Page(page): Page,
) -> Result<Json<Value>, ApiError> {
    let key = format!("tasks:{}", page.cache_key());
    cached(&state, key, TaskRepo::new(&state.pool).list_active_with_links(page)).await
}

/// GET /tasks/{id} - with author, projects and assignees
async fn get_task(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    let key = format!("tasks:{id}");
    cached(&state, key, TaskRepo::new(&state.pool).detail(id)).await
}

/// POST /tasks
async fn create_task(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let title = Title::new(&req.title)?;
    check_schedule(req.start, req.end)?;
    let author_id = match req.author_id {
        Some(id) => id,
        None => caller_employee_id(&state, &user).await?,
    };

    let task = TaskRepo::new(&state.pool)
        .create(NewTask {
            title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            start: req.start,
            end: req.end,
            author_id,
            projects: req.projects,
            employees: req.employees,
        })
        .await?;
    state.invalidate_reads();
    Ok(Json(task))
}

/// PATCH /tasks/{id} - author or moderator
async fn update_task(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    ensure_task_owner(&state, &user, id).await?;

    let repo = TaskRepo::new(&state.pool);
    let current = repo.crud().get_active(id).await?;
    check_schedule(req.start.or(current.start), req.end.or(current.end))?;

    let changes = TaskChanges {
        title: req.title.as_deref().map(Title::new).transpose()?,
        description: req.description,
        status: req.status,
        priority: req.priority,
        start: req.start,
        end: req.end,
        author_id: req.author_id,
        projects: req.projects,
        employees: req.employees,
    };
    let task = repo.update(id, changes).await?;
    state.invalidate_reads();
    Ok(Json(task))
}

/// DELETE /tasks/{id} - deactivates; author or moderator
async fn delete_task(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    ensure_task_owner(&state, &user, id).await?;
    TaskRepo::new(&state.pool).crud().deactivate(id).await?;
    state.invalidate_reads();
    Ok(success())
}

async fn caller_employee_id(state: &AppState, user: &User) -> Result<Uuid, ApiError> {
    EmployeeRepo::new(&state.pool)
        .find_by_user(user.id)
        .await?
        .map(|employee| employee.id)
        .ok_or_else(|| {
            ApiError::BadRequest("author_id is required without an employee profile".to_owned())
        })
}

/// Task routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
}
