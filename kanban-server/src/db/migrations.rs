//! Schema migrations for the Kanban tables
//!
//! Statements are idempotent (`IF NOT EXISTS`) and run in dependency order
//! inside one transaction.

use sqlx::SqlitePool;

use super::DbError;

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BLOB PRIMARY KEY NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            is_verify BOOLEAN NOT NULL DEFAULT 0,
            registration_date TEXT NOT NULL,
            permission TEXT NOT NULL DEFAULT 'none'
                CHECK (permission IN ('admin', 'moderator', 'user', 'none'))
        )
        "#,
    ),
    (
        "departments",
        r#"
        CREATE TABLE IF NOT EXISTS departments (
            id BLOB PRIMARY KEY NOT NULL,
            title TEXT NOT NULL UNIQUE
        )
        "#,
    ),
    (
        "employees",
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id BLOB PRIMARY KEY NOT NULL,
            family TEXT NOT NULL,
            name TEXT NOT NULL,
            surname TEXT NOT NULL,
            phone TEXT NOT NULL UNIQUE,
            department_id BLOB NOT NULL REFERENCES departments(id),
            user_id BLOB NOT NULL UNIQUE REFERENCES users(id)
        )
        "#,
    ),
    (
        "photos",
        r#"
        CREATE TABLE IF NOT EXISTS photos (
            id BLOB PRIMARY KEY NOT NULL,
            url TEXT NOT NULL,
            path TEXT NOT NULL,
            employee_id BLOB NOT NULL UNIQUE REFERENCES employees(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "projects",
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id BLOB PRIMARY KEY NOT NULL,
            title TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            is_active BOOLEAN NOT NULL DEFAULT 1
        )
        "#,
    ),
    (
        "tasks",
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id BLOB PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'todo'
                CHECK (status IN ('todo', 'doing', 'done', 'release')),
            priority TEXT NOT NULL DEFAULT 'none'
                CHECK (priority IN ('high', 'normal', 'low', 'none')),
            start_at TEXT,
            end_at TEXT,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            author_id BLOB NOT NULL REFERENCES employees(id)
        )
        "#,
    ),
    (
        "task_projects",
        r#"
        CREATE TABLE IF NOT EXISTS task_projects (
            task_id BLOB NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            project_id BLOB NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            UNIQUE (task_id, project_id)
        )
        "#,
    ),
    (
        "task_employees",
        r#"
        CREATE TABLE IF NOT EXISTS task_employees (
            task_id BLOB NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            employee_id BLOB NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
            UNIQUE (task_id, employee_id)
        )
        "#,
    ),
    (
        "indexes",
        r#"
        CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_author ON tasks(author_id);
        CREATE INDEX IF NOT EXISTS idx_task_projects_project ON task_projects(project_id);
        CREATE INDEX IF NOT EXISTS idx_task_employees_employee ON task_employees(employee_id)
        "#,
    ),
];

/// Run all migrations
pub async fn run(pool: &SqlitePool) -> Result<(), DbError> {
    tracing::info!("Running schema migrations...");

    let mut tx = pool.begin().await?;
    for (name, statement) in SCHEMA {
        tracing::debug!(table = name, "applying schema");
        sqlx::raw_sql(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("Schema migrations complete");
    Ok(())
}
