//! Employee endpoints
//!
//! `/employees/me` works on the caller's own profile; the id-based routes
//! are for moderators.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{cached, success};
use crate::db::{Employee, EmployeeChanges, EmployeeRepo, NewEmployee, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, Page, ValidUuid};
use crate::http::permissions::{RequireModerator, RequireUser};
use crate::http::server::AppState;
use crate::models::{PersonName, Phone};

/// Own profile
#[derive(Deserialize)]
pub struct MyEmployeeRequest {
    pub family: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub department_id: Uuid,
}

/// Profile for any user (moderators)
#[derive(Deserialize)]
pub struct CreateEmployeeRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub profile: MyEmployeeRequest,
}

/// Partial profile update; `user_id` is ignored on `/employees/me`
#[derive(Deserialize)]
pub struct UpdateEmployeeRequest {
    pub family: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl MyEmployeeRequest {
    fn validate(self, user_id: Uuid) -> Result<NewEmployee, ApiError> {
        Ok(NewEmployee {
            user_id,
            family: PersonName::new(&self.family)?,
            name: PersonName::new(&self.name)?,
            surname: PersonName::new(&self.surname)?,
            phone: Phone::new(&self.phone)?,
            department_id: self.department_id,
        })
    }
}

impl UpdateEmployeeRequest {
    fn validate(self) -> Result<EmployeeChanges, ApiError> {
        let name = |s: Option<String>| s.as_deref().map(PersonName::new).transpose();
        Ok(EmployeeChanges {
            family: name(self.family)?,
            name: name(self.name)?,
            surname: name(self.surname)?,
            phone: self.phone.as_deref().map(Phone::new).transpose()?,
            department_id: self.department_id,
            user_id: self.user_id,
        })
    }
}

/// GET /employees - employees with an active account
async fn list_employees(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    Page(page): Page,
) -> Result<Json<Value>, ApiError> {
    let key = format!("employees:{}", page.cache_key());
    cached(&state, key, EmployeeRepo::new(&state.pool).list_active(page)).await
}

/// GET /employees/{id} - with account, photo, department and tasks
async fn get_employee(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    let key = format!("employees:{id}");
    cached(&state, key, EmployeeRepo::new(&state.pool).detail(id)).await
}

/// POST /employees
async fn create_employee(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    JsonBody(req): JsonBody<CreateEmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    let new = req.profile.validate(req.user_id)?;
    let employee = EmployeeRepo::new(&state.pool).create(new).await?;
    state.invalidate_reads();
    Ok(Json(employee))
}

/// PATCH /employees/{id}
async fn update_employee(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    let employee = EmployeeRepo::new(&state.pool)
        .update(id, req.validate()?)
        .await?;
    state.invalidate_reads();
    Ok(Json(employee))
}

/// DELETE /employees/{id} - deactivates the account behind the profile
async fn delete_employee(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    EmployeeRepo::new(&state.pool).deactivate_user(id).await?;
    state.invalidate_reads();
    Ok(success())
}

/// GET /employees/me
async fn get_me(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>, ApiError> {
    let repo = EmployeeRepo::new(&state.pool);
    let employee = own_profile(&repo, user.id).await?;
    let detail = repo.detail(employee.id).await?;
    Ok(Json(serde_json::to_value(detail)?))
}

/// POST /employees/me
async fn create_me(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    JsonBody(req): JsonBody<MyEmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    let employee = EmployeeRepo::new(&state.pool)
        .create(req.validate(user.id)?)
        .await?;
    state.invalidate_reads();
    Ok(Json(employee))
}

/// PATCH /employees/me
async fn update_me(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    JsonBody(req): JsonBody<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    let repo = EmployeeRepo::new(&state.pool);
    let employee = own_profile(&repo, user.id).await?;
    let changes = EmployeeChanges {
        user_id: None,
        ..req.validate()?
    };
    let employee = repo.update(employee.id, changes).await?;
    state.invalidate_reads();
    Ok(Json(employee))
}

/// DELETE /employees/me - deactivates own account
async fn delete_me(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>, ApiError> {
    UserRepo::new(&state.pool).crud().deactivate(user.id).await?;
    state.invalidate_reads();
    Ok(success())
}

async fn own_profile(repo: &EmployeeRepo<'_>, user_id: Uuid) -> Result<Employee, ApiError> {
    repo.find_by_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("employee", user_id))
}

/// Employee routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/me", get(get_me).post(create_me).patch(update_me).delete(delete_me))
        .route("/employees/me/", get(get_me).post(create_me).patch(update_me).delete(delete_me))
        .route(
            "/employees/{id}",
            get(get_employee).patch(update_employee).delete(delete_employee),
        )
}
