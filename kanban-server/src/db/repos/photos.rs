//! Photo repository
//!
//! One photo per employee. Rows only describe where the file lives; the
//! HTTP layer owns the file itself.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::crud::{Crud, Entity};
use crate::db::DbError;

const COLUMNS: &str = "id, url, path, employee_id";

/// Photo record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: Uuid,
    pub url: String,
    pub path: String,
    pub employee_id: Uuid,
}

impl Photo {
    /// File name component of the stored path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl Entity for Photo {
    const TABLE: &'static str = "photos";
    const RESOURCE: &'static str = "photo";
    const COLUMNS: &'static str = COLUMNS;
}

/// Fields a PATCH may change
#[derive(Debug, Default)]
pub struct PhotoChanges {
    pub url: Option<String>,
    pub employee_id: Option<Uuid>,
}

/// Photo repository
pub struct PhotoRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PhotoRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub fn crud(&self) -> Crud<'a, Photo> {
        Crud::new(self.pool)
    }

    pub async fn find_by_employee(&self, employee_id: Uuid) -> Result<Option<Photo>, DbError> {
        let photo = sqlx::query_as(&format!("SELECT {COLUMNS} FROM photos WHERE employee_id = ?"))
            .bind(employee_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(photo)
    }

    /// Insert the employee's photo or replace the existing one. `id` is only
    /// used for a new row; an existing row keeps its id.
    pub async fn upsert_for_employee(
        &self,
        id: Uuid,
        employee_id: Uuid,
        url: &str,
        path: &str,
    ) -> Result<Photo, DbError> {
        let photo: Photo = sqlx::query_as(&format!(
            r#"
            INSERT INTO photos (id, url, path, employee_id)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (employee_id) DO UPDATE
            SET url = excluded.url, path = excluded.path
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(url)
        .bind(path)
        .bind(employee_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, Photo::RESOURCE, &[]))?;

        tracing::info!(photo_id = %photo.id, %employee_id, file = photo.file_name(), "photo stored");
        Ok(photo)
    }

    /// Apply a partial update; absent fields keep their value.
    pub async fn update(&self, id: Uuid, changes: PhotoChanges) -> Result<Photo, DbError> {
        let employee_id = changes.employee_id.map(|e| e.to_string()).unwrap_or_default();
        let sql = format!(
            r#"
            UPDATE photos
            SET url = COALESCE(?, url),
                employee_id = COALESCE(?, employee_id)
            WHERE id = ?
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as(&sql)
            .bind(changes.url.as_deref())
            .bind(changes.employee_id)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DbError::from_write(e, Photo::RESOURCE, &[("employee_id", &employee_id)]))?
            .ok_or_else(|| DbError::not_found(Photo::RESOURCE, id))
    }

    /// Delete the row and hand it back so the caller can remove the file.
    pub async fn delete(&self, id: Uuid) -> Result<Photo, DbError> {
        let sql = format!("DELETE FROM photos WHERE id = ? RETURNING {COLUMNS}");
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Photo::RESOURCE, id))
    }
}
