//! Token endpoints
//!
//! - POST /access: email + password → token pair
//! - POST /refresh: refresh token → fresh token pair

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::auth::{verify_password, AuthError, TokenMode, TokenPair};
use crate::db::UserRepo;
use crate::http::error::ApiError;
use crate::http::extractors::JsonBody;
use crate::http::server::AppState;

#[derive(Deserialize)]
pub struct AccessRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /access - log in
async fn access(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AccessRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user = UserRepo::new(&state.pool)
        .find_by_email(req.email.trim())
        .await?
        .filter(|user| user.is_active)
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(req.password, user.password_hash).await? {
        tracing::info!(email = %user.email, "login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    tracing::info!(user_id = %user.id, "tokens issued");
    Ok(Json(state.tokens.issue_pair(&user.email)?))
}

/// POST /refresh - trade a refresh token for a new pair
async fn refresh(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let claims = state
        .tokens
        .verify(&req.refresh_token, TokenMode::RefreshToken)?;

    let user = UserRepo::new(&state.pool)
        .find_by_email(&claims.email)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AuthError::InvalidCredentials)?;

    Ok(Json(state.tokens.issue_pair(&user.email)?))
}

/// Auth routes (no gate)
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/access", post(access))
        .route("/refresh", post(refresh))
}
