//! Project repository

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::crud::{Crud, Entity, SoftDelete};
use super::tasks::{TaskRepo, TaskWithLinks};
use crate::db::DbError;
use crate::models::Title;

const COLUMNS: &str = "id, title, description, is_active";

/// Project record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub is_active: bool,
}

impl Entity for Project {
    const TABLE: &'static str = "projects";
    const RESOURCE: &'static str = "project";
    const COLUMNS: &'static str = COLUMNS;
}

impl SoftDelete for Project {}

/// Fields a PATCH may change
#[derive(Debug, Default)]
pub struct ProjectChanges {
    pub title: Option<Title>,
    pub description: Option<String>,
}

/// Project with its active tasks
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<TaskWithLinks>,
}

/// Project repository
pub struct ProjectRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProjectRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub fn crud(&self) -> Crud<'a, Project> {
        Crud::new(self.pool)
    }

    /// Create an active project. Duplicate title → `DbError::Duplicate`.
    pub async fn create(&self, title: Title, description: Option<String>) -> Result<Project, DbError> {
        let project: Project = sqlx::query_as(&format!(
            "INSERT INTO projects (id, title, description) VALUES (?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(title.as_str())
        .bind(description.unwrap_or_default())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, Project::RESOURCE, &[("title", title.as_str())]))?;

        tracing::info!(project_id = %project.id, title = %project.title, "project created");
        Ok(project)
    }

    /// Apply a partial update to an active project.
    pub async fn update(&self, id: Uuid, changes: ProjectChanges) -> Result<Project, DbError> {
        let title = changes.title.as_ref().map(Title::as_str);
        let sql = format!(
            r#"
            UPDATE projects
            SET title = COALESCE(?, title),
                description = COALESCE(?, description)
            WHERE id = ? AND is_active = 1
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as(&sql)
            .bind(title)
            .bind(changes.description.as_deref())
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| {
                DbError::from_write(e, Project::RESOURCE, &[("title", title.unwrap_or_default())])
            })?
            .ok_or_else(|| DbError::not_found(Project::RESOURCE, id))
    }

    /// Active project plus its active tasks.
    pub async fn detail(&self, id: Uuid) -> Result<ProjectDetail, DbError> {
        let project = self.crud().get_active(id).await?;
        let tasks = TaskRepo::new(self.pool).in_project(id).await?;
        Ok(ProjectDetail { project, tasks })
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
    async fn description_defaults_to_empty() {
        let pool = pool().await;
        let project = ProjectRepo::new(&pool)
            .create(Title::new("Project1").unwrap(), None)
            .await
            .unwrap();

        assert_eq!(project.description, "");
        assert!(project.is_active);
    }

    #[tokio::test]
    async fn inactive_projects_are_not_editable() {
        let pool = pool().await;
        let repo = ProjectRepo::new(&pool);
        let project = repo
            .create(Title::new("Project1").unwrap(), Some("first".into()))
            .await
            .unwrap();

        let updated = repo
            .update(
                project.id,
                ProjectChanges {
                    description: Some("changed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Project1");
        assert_eq!(updated.description, "changed");

        repo.crud().deactivate(project.id).await.unwrap();
        assert!(matches!(
            repo.update(project.id, ProjectChanges::default()).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(repo.detail(project.id).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_title_is_reported() {
        let pool = pool().await;
        let repo = ProjectRepo::new(&pool);
        repo.create(Title::new("Same").unwrap(), None).await.unwrap();

        let err = repo.create(Title::new("Same").unwrap(), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Key (title)=(Same) already exists.");
    }
}
