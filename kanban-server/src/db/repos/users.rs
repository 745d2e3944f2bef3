//! User repository
//!
//! Accounts are soft-deleted (`is_active`) by their owners and hard-deleted
//! by moderators. Password hashes never leave this layer in serialized form.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::crud::{Crud, Entity, SoftDelete};
use crate::db::DbError;
use crate::models::{Email, UserPermission};

const COLUMNS: &str =
    "id, email, password_hash, is_active, is_verify, registration_date, permission";

/// User record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_verify: bool,
    pub registration_date: DateTime<Utc>,
    pub permission: UserPermission,
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const RESOURCE: &'static str = "user";
    const COLUMNS: &'static str = COLUMNS;
}

impl SoftDelete for User {}

/// Fields a PATCH may change
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<Email>,
    pub password_hash: Option<String>,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Generic CRUD for users
    pub fn crud(&self) -> Crud<'a, User> {
        Crud::new(self.pool)
    }

    /// Insert a new account. Duplicate email → `DbError::Duplicate`.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        permission: UserPermission,
    ) -> Result<User, DbError> {
        let user: User = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, is_active, is_verify, registration_date, permission)
            VALUES (?, ?, ?, 1, 0, ?, ?)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(email.as_str())
        .bind(password_hash)
        .bind(Utc::now())
        .bind(permission)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, User::RESOURCE, &[("email", email.as_str())]))?;

        tracing::info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Look up an account by email (active or not).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Apply a partial update; absent fields keep their value.
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, DbError> {
        let email = changes.email.as_ref().map(Email::as_str);
        let sql = format!(
            r#"
            UPDATE users
            SET email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash)
            WHERE id = ?
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as(&sql)
            .bind(email)
            .bind(changes.password_hash.as_deref())
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| {
                DbError::from_write(e, User::RESOURCE, &[("email", email.unwrap_or_default())])
            })?
            .ok_or_else(|| DbError::not_found(User::RESOURCE, id))
    }

    /// Change role (and optionally the verified flag).
    pub async fn set_permission(
        &self,
        id: Uuid,
        permission: UserPermission,
        is_verify: Option<bool>,
    ) -> Result<User, DbError> {
        let user: User = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET permission = ?, is_verify = COALESCE(?, is_verify)
            WHERE id = ?
            RETURNING {COLUMNS}
            "#
        ))
        .bind(permission)
        .bind(is_verify)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(User::RESOURCE, id))?;

        tracing::info!(user_id = %id, permission = %permission, "permission changed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};
    use crate::models::Pagination;

    async fn pool() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        migrations::run(&pool).await.unwrap();
        pool
    }

    fn email(s: &str) -> Email {
        Email::new(s).unwrap()
    }

    #[tokio::test]
    async fn create_defaults() {
        let pool = pool().await;
        let user = UserRepo::new(&pool)
            .create(&email("user@user.com"), "hash", UserPermission::None)
            .await
            .unwrap();

        assert!(user.is_active);
        assert!(!user.is_verify);
        assert_eq!(user.permission, UserPermission::None);
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        repo.create(&email("test@test.com"), "h", UserPermission::None)
            .await
            .unwrap();

        let err = repo
            .create(&email("test@test.com"), "h", UserPermission::None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Key (email)=(test@test.com) already exists.");
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        let user = repo
            .create(&email("a@a.com"), "old", UserPermission::User)
            .await
            .unwrap();

        let updated = repo
            .update(
                user.id,
                UserChanges {
                    email: Some(email("b@b.com")),
                    password_hash: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "b@b.com");
        assert_eq!(updated.password_hash, "old");
        assert_eq!(updated.registration_date, user.registration_date);
    }

    #[tokio::test]
    async fn permission_and_soft_delete() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        let user = repo
            .create(&email("m@m.com"), "h", UserPermission::None)
            .await
            .unwrap();

        let user = repo
            .set_permission(user.id, UserPermission::Moderator, Some(true))
            .await
            .unwrap();
        assert_eq!(user.permission, UserPermission::Moderator);
        assert!(user.is_verify);

        repo.crud().deactivate(user.id).await.unwrap();
        assert!(repo.crud().list_active(Pagination::default()).await.unwrap().is_empty());
        assert!(repo.find_by_email("m@m.com").await.unwrap().is_some());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::nil(),
            email: "x@x.com".into(),
            password_hash: "secret".into(),
            is_active: true,
            is_verify: false,
            registration_date: Utc::now(),
            permission: UserPermission::User,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["permission"], "user");
    }
}
