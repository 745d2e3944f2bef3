//! Generic CRUD over any table-backed entity
//!
//! `Crud<E>` provides list/get/delete for every entity. Entities that carry
//! an `is_active` flag also implement [`SoftDelete`], which unlocks the
//! active-only reads and `deactivate`.

use std::marker::PhantomData;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::db::DbError;
use crate::models::Pagination;

/// A row type mapped onto one table.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Table name
    const TABLE: &'static str;
    /// Name used in error messages
    const RESOURCE: &'static str;
    /// Column list in the order `FromRow` expects
    const COLUMNS: &'static str;
}

/// Entity with an `is_active` column; deletes only flip the flag.
pub trait SoftDelete: Entity {}

/// Generic repository over one entity type
pub struct Crud<'a, E> {
    pool: &'a SqlitePool,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> Crud<'a, E> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// List rows in insertion order.
    pub async fn list(&self, page: Pagination) -> Result<Vec<E>, DbError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid LIMIT ? OFFSET ?",
            E::COLUMNS,
            E::TABLE
        );
        let rows = sqlx::query_as::<_, E>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a single row by id.
    pub async fn get(&self, id: Uuid) -> Result<E, DbError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", E::COLUMNS, E::TABLE);
        sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(E::RESOURCE, id))
    }

    /// Whether a row with this id exists.
    pub async fn exists(&self, id: Uuid) -> Result<bool, DbError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", E::TABLE);
        let (exists,): (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(self.pool).await?;
        Ok(exists)
    }

    /// Delete a row. Fails with `StillReferenced` if other rows point at it.
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| DbError::from_delete(e, E::RESOURCE))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(E::RESOURCE, id));
        }
        tracing::debug!(resource = E::RESOURCE, %id, "row deleted");
        Ok(())
    }
}

impl<'a, E: SoftDelete> Crud<'a, E> {
    /// List active rows in insertion order.
    pub async fn list_active(&self, page: Pagination) -> Result<Vec<E>, DbError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE is_active = 1 ORDER BY rowid LIMIT ? OFFSET ?",
            E::COLUMNS,
            E::TABLE
        );
        let rows = sqlx::query_as::<_, E>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get an active row; inactive rows read as missing.
    pub async fn get_active(&self, id: Uuid) -> Result<E, DbError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND is_active = 1",
            E::COLUMNS,
            E::TABLE
        );
        sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(E::RESOURCE, id))
    }

    /// Soft delete: clear `is_active`.
    pub async fn deactivate(&self, id: Uuid) -> Result<(), DbError> {
        let sql = format!("UPDATE {} SET is_active = 0 WHERE id = ?", E::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(E::RESOURCE, id));
        }
        tracing::debug!(resource = E::RESOURCE, %id, "row deactivated");
        Ok(())
    }
}
