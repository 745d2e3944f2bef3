//! User endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use super::{cached, success};
use crate::auth::hash_password;
use crate::db::{User, UserChanges, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, Page, ValidUuid};
use crate::http::permissions::{RequireAdmin, RequireModerator, RequireUser};
use crate::http::server::AppState;
use crate::models::{Email, Password, UserPermission};

/// Registration request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Partial account update
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Role change
#[derive(Deserialize)]
pub struct PermissionRequest {
    pub permission: UserPermission,
    pub is_verify: Option<bool>,
}

impl UpdateUserRequest {
    /// Validate fields and hash a new password.
    async fn into_changes(self) -> Result<UserChanges, ApiError> {
        let email = self.email.as_deref().map(Email::new).transpose()?;
        let password_hash = match self.password {
            Some(raw) => Some(hash_password(Password::new(&raw)?).await?),
            None => None,
        };
        Ok(UserChanges {
            email,
            password_hash,
        })
    }
}

/// GET /users - active accounts
async fn list_users(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    Page(page): Page,
) -> Result<Json<Value>, ApiError> {
    let key = format!("users:{}", page.cache_key());
    cached(&state, key, UserRepo::new(&state.pool).crud().list_active(page)).await
}

/// GET /users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
) -> Result<Json<User>, ApiError> {
    Ok(Json(UserRepo::new(&state.pool).crud().get(id).await?))
}

/// POST /users - public registration
async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let email = Email::new(&req.email)?;
    let hash = hash_password(Password::new(&req.password)?).await?;

    let user = UserRepo::new(&state.pool)
        .create(&email, &hash, UserPermission::default())
        .await?;
    state.invalidate_reads();
    Ok(Json(user))
}

/// PATCH /users/{id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let changes = req.into_changes().await?;
    let user = UserRepo::new(&state.pool).update(id, changes).await?;
    state.invalidate_reads();
    Ok(Json(user))
}

/// DELETE /users/{id} - hard delete
async fn delete_user(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    UserRepo::new(&state.pool).crud().delete(id).await?;
    state.invalidate_reads();
    Ok(success())
}

/// PUT /users/{id}/permission - change role
async fn set_permission(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<PermissionRequest>,
) -> Result<Json<User>, ApiError> {
    let user = UserRepo::new(&state.pool)
        .set_permission(id, req.permission, req.is_verify)
        .await?;
    tracing::info!(admin_id = %admin.id, user_id = %id, permission = %user.permission, "role granted");
    state.invalidate_reads();
    Ok(Json(user))
}

/// GET /users/me
async fn get_me(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}

/// PATCH /users/me
async fn update_me(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let changes = req.into_changes().await?;
    let user = UserRepo::new(&state.pool).update(user.id, changes).await?;
    state.invalidate_reads();
    Ok(Json(user))
}

/// DELETE /users/me - deactivate own account
async fn delete_me(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>, ApiError> {
    UserRepo::new(&state.pool).crud().deactivate(user.id).await?;
    tracing::info!(user_id = %user.id, "account deactivated by owner");
    state.invalidate_reads();
    Ok(success())
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(get_me).patch(update_me).delete(delete_me))
        .route("/users/me/", get(get_me).patch(update_me).delete(delete_me))
        .route("/users/{id}", get(get_user).patch(update_user).delete(delete_user))
        .route("/users/{id}/permission", put(set_permission))
}
