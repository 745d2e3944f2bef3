//! Permission gates
//!
//! Each gate is an extractor: it reads the bearer token, loads the active
//! account behind it and checks the role. Handlers receive the [`User`].
//!
//! - no usable header → 403 `Not authenticated`
//! - bad token, unknown or inactive account → 401
//! - role too low → 403 `Don't have permissions`

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;
use super::server::AppState;
use crate::auth::{AuthError, TokenMode};
use crate::db::{TaskRepo, User, UserRepo};
use crate::models::UserPermission;

/// Any role except `none`
pub struct RequireUser(pub User);

/// `moderator` or `admin`
pub struct RequireModerator(pub User);

/// `admin` only
pub struct RequireAdmin(pub User);

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        require(user, UserPermission::is_member).map(Self)
    }
}

impl FromRequestParts<Arc<AppState>> for RequireModerator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        require(user, UserPermission::is_moderator).map(Self)
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        require(user, UserPermission::is_admin).map(Self)
    }
}

/// Only the task's author or a moderator may change it.
pub async fn ensure_task_owner(state: &AppState, user: &User, task_id: Uuid) -> Result<(), ApiError> {
    let owner = TaskRepo::new(&state.pool).owner_user_id(task_id).await?;
    if owner == user.id || user.permission.is_moderator() {
        return Ok(());
    }
    tracing::debug!(user_id = %user.id, %task_id, "task change refused, not the author");
    Err(AuthError::NotOwner.into())
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AuthError::MissingToken)?;

    let claims = state.tokens.verify(token, TokenMode::AccessToken)?;

    match UserRepo::new(&state.pool).find_by_email(&claims.email).await? {
        Some(user) if user.is_active => Ok(user),
        _ => {
            tracing::debug!(email = %claims.email, "token for unknown or inactive account");
            Err(AuthError::InvalidCredentials.into())
        }
    }
}

fn require(user: User, allowed: fn(&UserPermission) -> bool) -> Result<User, ApiError> {
    if allowed(&user.permission) {
        Ok(user)
    } else {
        tracing::debug!(user_id = %user.id, permission = %user.permission, "permission denied");
        Err(AuthError::Forbidden.into())
    }
}

/// Token from `Bearer <t>` or `JWT <t>`.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    let known = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt");
    (known && !token.is_empty()).then_some(token)
}
