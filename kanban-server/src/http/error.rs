//! API error types with IntoResponse
//!
//! Errors are converted to `{"error": <code>, "detail": <message>}` with the
//! matching status code. Internal failures are logged and never echoed.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::media::MediaError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Malformed request, dangling or blocking reference (400)
    BadRequest(String),

    /// Unique constraint violation (400)
    Duplicate(String),

    /// Bad credentials or token (401)
    Unauthorized(String),

    /// Missing token, low role, not the owner (403)
    Forbidden(String),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Upload over the configured limit (413)
    PayloadTooLarge,

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::Duplicate(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, detail) = match &self {
            Self::Validation(e) => ("validation_error", e.to_string()),
            Self::BadRequest(detail) => ("bad_request", detail.clone()),
            Self::Duplicate(detail) => ("duplicate", detail.clone()),
            Self::Unauthorized(detail) => ("unauthorized", detail.clone()),
            Self::Forbidden(detail) => ("forbidden", detail.clone()),
            Self::NotFound { resource, id } => {
                tracing::debug!(resource = *resource, id = %id, "not found");
                ("not_found", "Not found".to_owned())
            }
            Self::PayloadTooLarge => ("payload_too_large", "Upload is too large".to_owned()),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                ("internal_error", "an internal error occurred".to_owned())
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                ("internal_error", "an internal error occurred".to_owned())
            }
        };

        (self.status(), Json(json!({ "error": code, "detail": detail }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Duplicate { .. } => Self::Duplicate(e.to_string()),
            DbError::MissingReference { .. } | DbError::StillReferenced { .. } => {
                Self::BadRequest(e.to_string())
            }
            DbError::Sqlx(_) => Self::Database(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken | AuthError::Forbidden | AuthError::NotOwner => {
                Self::Forbidden(e.to_string())
            }
            AuthError::InvalidCredentials => Self::Unauthorized(e.to_string()),
            AuthError::Token(_) | AuthError::Hash(_) | AuthError::Lifetime => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::UnsupportedType(_) => Self::BadRequest(e.to_string()),
            MediaError::Io(_) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("response serialization failed: {e}"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::BadRequest(e.body_text())
    }
}
