//! Task repository
//!
//! Handles tasks with:
//! - Atomic create/update of the task row and both link tables (transaction)
//! - Link loading for many tasks in two queries (no N+1)
//! - Author lookup for ownership checks

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::crud::{Crud, Entity, SoftDelete};
use super::employees::Employee;
use super::projects::Project;
use crate::db::DbError;
use crate::models::{Pagination, TaskPriority, TaskStatus, Title};

const COLUMNS: &str =
    "id, title, description, status, priority, start_at, end_at, is_active, author_id";

/// Task record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[sqlx(rename = "start_at")]
    pub start: Option<DateTime<Utc>>,
    #[sqlx(rename = "end_at")]
    pub end: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub author_id: Uuid,
}

impl Entity for Task {
    const TABLE: &'static str = "tasks";
    const RESOURCE: &'static str = "task";
    const COLUMNS: &'static str = COLUMNS;
}

impl SoftDelete for Task {}

/// Task with its linked projects and assignees
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithLinks {
    #[serde(flatten)]
    pub task: Task,
    pub projects: Vec<Project>,
    pub employees: Vec<Employee>,
}

/// Task with author and links expanded
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub author: Employee,
    pub projects: Vec<Project>,
    pub employees: Vec<Employee>,
}

/// Validated input for a new task
#[derive(Debug)]
pub struct NewTask {
    pub title: Title,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Defaults to now
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub projects: Vec<Uuid>,
    pub employees: Vec<Uuid>,
}

/// Fields a PATCH may change; link lists replace the current set
#[derive(Debug, Default)]
pub struct TaskChanges {
    pub title: Option<Title>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub author_id: Option<Uuid>,
    pub projects: Option<Vec<Uuid>>,
    pub employees: Option<Vec<Uuid>>,
}

#[derive(FromRow)]
struct ProjectLink {
    task_id: Uuid,
    #[sqlx(flatten)]
    project: Project,
}

#[derive(FromRow)]
struct EmployeeLink {
    task_id: Uuid,
    #[sqlx(flatten)]
    employee: Employee,
}

/// Task repository
pub struct TaskRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TaskRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub fn crud(&self) -> Crud<'a, Task> {
        Crud::new(self.pool)
    }

    /// Create a task with its links (atomic).
    ///
    /// Unknown author, project or employee → `MissingReference`.
    pub async fn create(&self, new: NewTask) -> Result<Task, DbError> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "employees", Employee::RESOURCE, new.author_id).await?;

        let task: Task = sqlx::query_as(&format!(
            r#"
            INSERT INTO tasks (id, title, description, status, priority, start_at, end_at, author_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.title.as_str())
        .bind(new.description.unwrap_or_default())
        .bind(new.status)
        .bind(new.priority)
        .bind(new.start.unwrap_or_else(Utc::now))
        .bind(new.end)
        .bind(new.author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from_write(e, Task::RESOURCE, &[]))?;

        replace_projects(&mut tx, task.id, &new.projects).await?;
        replace_employees(&mut tx, task.id, &new.employees).await?;

        tx.commit().await?;
        tracing::info!(task_id = %task.id, author_id = %task.author_id, "task created");
        Ok(task)
    }

    /// Apply a partial update to an active task (atomic).
    pub async fn update(&self, id: Uuid, changes: TaskChanges) -> Result<Task, DbError> {
        let mut tx = self.pool.begin().await?;

        if let Some(author_id) = changes.author_id {
            ensure_exists(&mut tx, "employees", Employee::RESOURCE, author_id).await?;
        }

        let task: Task = sqlx::query_as(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                start_at = COALESCE(?, start_at),
                end_at = COALESCE(?, end_at),
                author_id = COALESCE(?, author_id)
            WHERE id = ? AND is_active = 1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(changes.title.as_ref().map(Title::as_str))
        .bind(changes.description.as_deref())
        .bind(changes.status)
        .bind(changes.priority)
        .bind(changes.start)
        .bind(changes.end)
        .bind(changes.author_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DbError::from_write(e, Task::RESOURCE, &[]))?
        .ok_or_else(|| DbError::not_found(Task::RESOURCE, id))?;

        if let Some(projects) = &changes.projects {
            replace_projects(&mut tx, id, projects).await?;
        }
        if let Some(employees) = &changes.employees {
            replace_employees(&mut tx, id, employees).await?;
        }

        tx.commit().await?;
        tracing::debug!(task_id = %id, "task updated");
        Ok(task)
    }

    /// Active tasks with links, in insertion order.
    pub async fn list_active_with_links(
        &self,
        page: Pagination,
    ) -> Result<Vec<TaskWithLinks>, DbError> {
        let tasks = self.crud().list_active(page).await?;
        self.load_links(tasks).await
    }

    /// Active task with author and links.
    pub async fn detail(&self, id: Uuid) -> Result<TaskDetail, DbError> {
        let task = self.crud().get_active(id).await?;
        let author = Crud::<Employee>::new(self.pool).get(task.author_id).await?;
        let TaskWithLinks {
            task,
            projects,
            employees,
        } = self
            .load_links(vec![task])
            .await?
            .pop()
            .ok_or_else(|| DbError::not_found(Task::RESOURCE, id))?;

        Ok(TaskDetail {
            task,
            author,
            projects,
            employees,
        })
    }

    /// Active tasks written by an employee.
    pub async fn authored_by(&self, employee_id: Uuid) -> Result<Vec<TaskWithLinks>, DbError> {
        let tasks = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE author_id = ? AND is_active = 1 ORDER BY rowid"
        ))
        .bind(employee_id)
        .fetch_all(self.pool)
        .await?;
        self.load_links(tasks).await
    }

    /// Active tasks an employee is assigned to.
    pub async fn assigned_to(&self, employee_id: Uuid) -> Result<Vec<TaskWithLinks>, DbError> {
        let tasks = sqlx::query_as(&prefixed(
            "JOIN task_employees te ON te.task_id = t.id WHERE te.employee_id = ? AND t.is_active = 1",
        ))
        .bind(employee_id)
        .fetch_all(self.pool)
        .await?;
        self.load_links(tasks).await
    }

    /// Active tasks linked to a project.
    pub async fn in_project(&self, project_id: Uuid) -> Result<Vec<TaskWithLinks>, DbError> {
        let tasks = sqlx::query_as(&prefixed(
            "JOIN task_projects tp ON tp.task_id = t.id WHERE tp.project_id = ? AND t.is_active = 1",
        ))
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;
        self.load_links(tasks).await
    }

    /// User account owning an active task (through its author).
    pub async fn owner_user_id(&self, task_id: Uuid) -> Result<Uuid, DbError> {
        let owner: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT e.user_id
            FROM tasks t
            JOIN employees e ON e.id = t.author_id
            WHERE t.id = ? AND t.is_active = 1
            "#,
        )
        .bind(task_id)
        .fetch_optional(self.pool)
        .await?;

        owner
            .map(|(user_id,)| user_id)
            .ok_or_else(|| DbError::not_found(Task::RESOURCE, task_id))
    }

    /// Attach projects and assignees to tasks, preserving task order.
    pub async fn load_links(&self, tasks: Vec<Task>) -> Result<Vec<TaskWithLinks>, DbError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT tp.task_id, p.id, p.title, p.description, p.is_active \
             FROM task_projects tp JOIN projects p ON p.id = tp.project_id \
             WHERE tp.task_id IN (",
        );
        push_ids(&mut query, &ids);
        query.push(") ORDER BY p.rowid");
        let project_links: Vec<ProjectLink> =
            query.build_query_as().fetch_all(self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT te.task_id, e.id, e.family, e.name, e.surname, e.phone, e.department_id, e.user_id \
             FROM task_employees te JOIN employees e ON e.id = te.employee_id \
             WHERE te.task_id IN (",
        );
        push_ids(&mut query, &ids);
        query.push(") ORDER BY e.rowid");
        let employee_links: Vec<EmployeeLink> =
            query.build_query_as().fetch_all(self.pool).await?;

        let mut projects: HashMap<Uuid, Vec<Project>> = HashMap::new();
        for link in project_links {
            projects.entry(link.task_id).or_default().push(link.project);
        }
        let mut employees: HashMap<Uuid, Vec<Employee>> = HashMap::new();
        for link in employee_links {
            employees.entry(link.task_id).or_default().push(link.employee);
        }

        Ok(tasks
            .into_iter()
            .map(|task| TaskWithLinks {
                projects: projects.remove(&task.id).unwrap_or_default(),
                employees: employees.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect())
    }
}

/// `SELECT <task columns> FROM tasks t <rest> ORDER BY t.rowid`
fn prefixed(rest: &str) -> String {
    let columns = COLUMNS
        .split(", ")
        .map(|c| format!("t.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM tasks t {rest} ORDER BY t.rowid")
}

fn push_ids(query: &mut QueryBuilder<'_, Sqlite>, ids: &[Uuid]) {
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}

async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    resource: &'static str,
    id: Uuid,
) -> Result<(), DbError> {
    let (exists,): (bool,) =
        sqlx::query_as(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"))
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    if !exists {
        return Err(DbError::missing_reference(resource, id));
    }
    Ok(())
}

async fn replace_projects(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    projects: &[Uuid],
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM task_projects WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;
    for project_id in projects {
        ensure_exists(conn, "projects", Project::RESOURCE, *project_id).await?;
        sqlx::query(
            "INSERT INTO task_projects (task_id, project_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(task_id)
        .bind(*project_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn replace_employees(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    employees: &[Uuid],
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM task_employees WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;
    for employee_id in employees {
        ensure_exists(conn, "employees", Employee::RESOURCE, *employee_id).await?;
        sqlx::query(
            "INSERT INTO task_employees (task_id, employee_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(task_id)
        .bind(*employee_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
