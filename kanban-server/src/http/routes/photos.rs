//! Employee photo endpoints
//!
//! Uploads arrive as multipart forms with a single `photo` field. The file
//! lands in the media store and the row points at it.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{cached, success};
use crate::db::{EmployeeRepo, Photo, PhotoChanges, PhotoRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, Page, ValidUuid};
use crate::http::permissions::{RequireModerator, RequireUser};
use crate::http::server::AppState;

const PHOTO_FIELD: &str = "photo";

#[derive(Deserialize)]
pub struct UpdatePhotoRequest {
    pub url: Option<String>,
    pub employee_id: Option<Uuid>,
}

/// GET /photos
async fn list_photos(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    Page(page): Page,
) -> Result<Json<Value>, ApiError> {
    let key = format!("photos:{}", page.cache_key());
    cached(&state, key, PhotoRepo::new(&state.pool).crud().list(page)).await
}

/// GET /photos/{id}
async fn get_photo(
    State(state): State<Arc<AppState>>,
    RequireUser(_): RequireUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    let key = format!("photos:{id}");
    cached(&state, key, PhotoRepo::new(&state.pool).crud().get(id)).await
}

/// PUT /photos/{employee_id} - upload for any employee
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(employee_id): ValidUuid,
    multipart: Multipart,
) -> Result<Json<Photo>, ApiError> {
    if !EmployeeRepo::new(&state.pool).crud().exists(employee_id).await? {
        return Err(ApiError::not_found("employee", employee_id));
    }
    store_photo(&state, employee_id, multipart).await.map(Json)
}

/// PUT /photos/me - upload for own employee profile
async fn upload_my_photo(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    multipart: Multipart,
) -> Result<Json<Photo>, ApiError> {
    let employee = EmployeeRepo::new(&state.pool)
        .find_by_user(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("employee", user.id))?;
    store_photo(&state, employee.id, multipart).await.map(Json)
}

/// PATCH /photos/{id}
async fn update_photo(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdatePhotoRequest>,
) -> Result<Json<Photo>, ApiError> {
    let changes = PhotoChanges {
        url: req.url,
        employee_id: req.employee_id,
    };
    let photo = PhotoRepo::new(&state.pool).update(id, changes).await?;
    state.invalidate_reads();
    Ok(Json(photo))
}

/// DELETE /photos/{id} - removes the row and the file
async fn delete_photo(
    State(state): State<Arc<AppState>>,
    RequireModerator(_): RequireModerator,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Value>, ApiError> {
    let photo = PhotoRepo::new(&state.pool).delete(id).await?;
    state.invalidate_reads();

    // The row is gone either way; a leftover file is only an orphan
    if let Err(e) = state.media.remove(&photo.path).await {
        tracing::error!(photo_id = %photo.id, path = %photo.path, error = %e, "failed to remove photo file");
    }
    Ok(success())
}

/// Write the uploaded file and point the employee's photo row at it.
async fn store_photo(
    state: &AppState,
    employee_id: Uuid,
    mut multipart: Multipart,
) -> Result<Photo, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await?;

        let repo = PhotoRepo::new(&state.pool);
        let previous = repo.find_by_employee(employee_id).await?;
        let photo_id = previous.as_ref().map_or_else(Uuid::new_v4, |p| p.id);
        let stored = state
            .media
            .save_photo(photo_id, &content_type, &bytes)
            .await?;
        let photo = repo
            .upsert_for_employee(photo_id, employee_id, &stored.url, &stored.path)
            .await?;

        // A new extension means a new file name; drop the stale file
        if let Some(previous) = previous.filter(|p| p.path != photo.path) {
            state.media.remove(&previous.path).await?;
        }
        state.invalidate_reads();
        return Ok(photo);
    }
    Err(ApiError::BadRequest(format!(
        "multipart field '{PHOTO_FIELD}' is required"
    )))
}

/// Photo routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/photos", get(list_photos))
        .route("/photos/me", put(upload_my_photo))
        .route("/photos/me/", put(upload_my_photo))
        .route(
            "/photos/{id}",
            get(get_photo)
                .put(upload_photo)
                .patch(update_photo)
                .delete(delete_photo),
        )
}
