//! Department repository

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::crud::{Crud, Entity};
use super::employees::Employee;
use crate::db::DbError;
use crate::models::Title;

/// Department record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: Uuid,
    pub title: String,
}

impl Entity for Department {
    const TABLE: &'static str = "departments";
    const RESOURCE: &'static str = "department";
    const COLUMNS: &'static str = "id, title";
}

/// Department with its staff
#[derive(Debug, Serialize)]
pub struct DepartmentDetail {
    #[serde(flatten)]
    pub department: Department,
    pub employees: Vec<Employee>,
}

/// Department repository
pub struct DepartmentRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DepartmentRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub fn crud(&self) -> Crud<'a, Department> {
        Crud::new(self.pool)
    }

    /// Create a department. Duplicate title → `DbError::Duplicate`.
    pub async fn create(&self, title: &Title) -> Result<Department, DbError> {
        let department = sqlx::query_as(
            "INSERT INTO departments (id, title) VALUES (?, ?) RETURNING id, title",
        )
        .bind(Uuid::new_v4())
        .bind(title.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, Department::RESOURCE, &[("title", title.as_str())]))?;

        Ok(department)
    }

    /// Rename a department; `None` leaves the row untouched.
    pub async fn update(&self, id: Uuid, title: Option<&Title>) -> Result<Department, DbError> {
        let title = title.map(Title::as_str);
        sqlx::query_as(
            r#"
            UPDATE departments
            SET title = COALESCE(?, title)
            WHERE id = ?
            RETURNING id, title
            "#,
        )
        .bind(title)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            DbError::from_write(e, Department::RESOURCE, &[("title", title.unwrap_or_default())])
        })?
        .ok_or_else(|| DbError::not_found(Department::RESOURCE, id))
    }

    /// Department plus every employee assigned to it.
    pub async fn with_employees(&self, id: Uuid) -> Result<DepartmentDetail, DbError> {
        let department = self.crud().get(id).await?;
        let employees = sqlx::query_as(&format!(
            "SELECT {} FROM employees WHERE department_id = ? ORDER BY rowid",
            Employee::COLUMNS
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(DepartmentDetail {
            department,
            employees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};

    async fn pool() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        migrations::run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn duplicate_title_is_reported() {
        let pool = pool().await;
        let repo = DepartmentRepo::new(&pool);
        let title = Title::new("Department1").unwrap();
        repo.create(&title).await.unwrap();

        let err = repo.create(&title).await.unwrap_err();
        assert_eq!(err.to_string(), "Key (title)=(Department1) already exists.");
    }

    #[tokio::test]
    async fn rename_and_missing_row() {
        let pool = pool().await;
        let repo = DepartmentRepo::new(&pool);
        let dep = repo.create(&Title::new("Old").unwrap()).await.unwrap();

        let renamed = repo
            .update(dep.id, Some(&Title::new("New").unwrap()))
            .await
            .unwrap();
        assert_eq!(renamed.title, "New");

        let unchanged = repo.update(dep.id, None).await.unwrap();
        assert_eq!(unchanged.title, "New");

        assert!(matches!(
            repo.update(Uuid::new_v4(), None).await,
            Err(DbError::NotFound { resource: "department", .. })
        ));
    }

    #[tokio::test]
    async fn detail_of_empty_department() {
        let pool = pool().await;
        let repo = DepartmentRepo::new(&pool);
        let dep = repo.create(&Title::new("Empty").unwrap()).await.unwrap();

        let detail = repo.with_employees(dep.id).await.unwrap();
        assert!(detail.employees.is_empty());

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["title"], "Empty");
        assert!(json["employees"].as_array().unwrap().is_empty());
    }
}
