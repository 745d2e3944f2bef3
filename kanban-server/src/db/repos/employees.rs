//! Employee repository
//!
//! An employee is the CRM profile of exactly one user account. "Deleting"
//! an employee deactivates that account; the profile row stays so task
//! authorship survives.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::crud::{Crud, Entity};
use super::departments::Department;
use super::photos::Photo;
use super::tasks::{TaskRepo, TaskWithLinks};
use super::users::User;
use crate::db::DbError;
use crate::models::{short_name, Pagination, PersonName, Phone};

const COLUMNS: &str = "id, family, name, surname, phone, department_id, user_id";

/// Employee record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: Uuid,
    pub family: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub department_id: Uuid,
    pub user_id: Uuid,
}

impl Employee {
    /// "Family N.S."
    pub fn short_name(&self) -> String {
        short_name(&self.family, &self.name, &self.surname)
    }
}

impl Entity for Employee {
    const TABLE: &'static str = "employees";
    const RESOURCE: &'static str = "employee";
    const COLUMNS: &'static str = COLUMNS;
}

/// Validated input for a new profile
#[derive(Debug)]
pub struct NewEmployee {
    pub user_id: Uuid,
    pub family: PersonName,
    pub name: PersonName,
    pub surname: PersonName,
    pub phone: Phone,
    pub department_id: Uuid,
}

/// Fields a PATCH may change
#[derive(Debug, Default)]
pub struct EmployeeChanges {
    pub family: Option<PersonName>,
    pub name: Option<PersonName>,
    pub surname: Option<PersonName>,
    pub phone: Option<Phone>,
    pub department_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Employee with everything the profile page shows
#[derive(Debug, Serialize)]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: Employee,
    pub user: User,
    pub photo: Option<Photo>,
    pub department: Department,
    /// Tasks this employee authored
    pub my_tasks: Vec<TaskWithLinks>,
    /// Tasks this employee is assigned to
    pub tasks: Vec<TaskWithLinks>,
}

/// Employee repository
pub struct EmployeeRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EmployeeRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub fn crud(&self) -> Crud<'a, Employee> {
        Crud::new(self.pool)
    }

    /// Create a profile for an active user.
    ///
    /// Unknown or inactive user → `NotFound`; unknown department →
    /// `MissingReference`; taken phone or user → `Duplicate`.
    pub async fn create(&self, new: NewEmployee) -> Result<Employee, DbError> {
        let mut tx = self.pool.begin().await?;

        let (user_active,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = ? AND is_active = 1)")
                .bind(new.user_id)
                .fetch_one(&mut *tx)
                .await?;
        if !user_active {
            return Err(DbError::not_found(User::RESOURCE, new.user_id));
        }

        let (department_exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?)")
                .bind(new.department_id)
                .fetch_one(&mut *tx)
                .await?;
        if !department_exists {
            return Err(DbError::missing_reference(Department::RESOURCE, new.department_id));
        }

        let user_id = new.user_id.to_string();
        let employee: Employee = sqlx::query_as(&format!(
            r#"
            INSERT INTO employees (id, family, name, surname, phone, department_id, user_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.family.as_str())
        .bind(new.name.as_str())
        .bind(new.surname.as_str())
        .bind(new.phone.as_str())
        .bind(new.department_id)
        .bind(new.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            DbError::from_write(
                e,
                Employee::RESOURCE,
                &[("phone", new.phone.as_str()), ("user_id", &user_id)],
            )
        })?;

        tx.commit().await?;
        tracing::info!(employee_id = %employee.id, name = %employee.short_name(), "employee created");
        Ok(employee)
    }

    /// Apply a partial update; absent fields keep their value.
    pub async fn update(&self, id: Uuid, changes: EmployeeChanges) -> Result<Employee, DbError> {
        let phone = changes.phone.as_ref().map(Phone::as_str);
        let user_id = changes.user_id.map(|u| u.to_string()).unwrap_or_default();
        let sql = format!(
            r#"
            UPDATE employees
            SET family = COALESCE(?, family),
                name = COALESCE(?, name),
                surname = COALESCE(?, surname),
                phone = COALESCE(?, phone),
                department_id = COALESCE(?, department_id),
                user_id = COALESCE(?, user_id)
            WHERE id = ?
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as(&sql)
            .bind(changes.family.as_ref().map(PersonName::as_str))
            .bind(changes.name.as_ref().map(PersonName::as_str))
            .bind(changes.surname.as_ref().map(PersonName::as_str))
            .bind(phone)
            .bind(changes.department_id)
            .bind(changes.user_id)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| {
                DbError::from_write(
                    e,
                    Employee::RESOURCE,
                    &[("phone", phone.unwrap_or_default()), ("user_id", &user_id)],
                )
            })?
            .ok_or_else(|| DbError::not_found(Employee::RESOURCE, id))
    }

    /// Profile belonging to a user account, if any.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Employee>, DbError> {
        let employee = sqlx::query_as(&format!("SELECT {COLUMNS} FROM employees WHERE user_id = ?"))
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(employee)
    }

    /// Employees whose account is still active.
    pub async fn list_active(&self, page: Pagination) -> Result<Vec<Employee>, DbError> {
        let rows = sqlx::query_as(
            r#"
            SELECT e.id, e.family, e.name, e.surname, e.phone, e.department_id, e.user_id
            FROM employees e
            JOIN users u ON u.id = e.user_id
            WHERE u.is_active = 1
            ORDER BY e.rowid
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Employee with account, photo, department and both task lists.
    pub async fn detail(&self, id: Uuid) -> Result<EmployeeDetail, DbError> {
        let employee = self.crud().get(id).await?;
        let user = Crud::<User>::new(self.pool).get(employee.user_id).await?;
        let department = Crud::<Department>::new(self.pool)
            .get(employee.department_id)
            .await?;
        let photo = sqlx::query_as(&format!(
            "SELECT {} FROM photos WHERE employee_id = ?",
            Photo::COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let tasks = TaskRepo::new(self.pool);
        let my_tasks = tasks.authored_by(id).await?;
        let assigned = tasks.assigned_to(id).await?;

        Ok(EmployeeDetail {
            employee,
            user,
            photo,
            department,
            my_tasks,
            tasks: assigned,
        })
    }

    /// Deactivate the account behind a profile.
    pub async fn deactivate_user(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE users SET is_active = 0 WHERE id = (SELECT user_id FROM employees WHERE id = ?)",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(Employee::RESOURCE, id));
        }
        tracing::info!(employee_id = %id, "employee account deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations, DepartmentRepo, UserRepo};
    use crate::models::{Email, Title, UserPermission};

    async fn pool() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        migrations::run(&pool).await.unwrap();
        pool
    }

    async fn seed(pool: &SqlitePool, email: &str) -> (User, Department) {
        let user = UserRepo::new(pool)
            .create(&Email::new(email).unwrap(), "h", UserPermission::User)
            .await
            .unwrap();
        let department = DepartmentRepo::new(pool)
            .create(&Title::new(&format!("Dep {email}")).unwrap())
            .await
            .unwrap();
        (user, department)
    }

    fn new_employee(user: &User, department: &Department, phone: &str) -> NewEmployee {
        NewEmployee {
            user_id: user.id,
            family: PersonName::new("ivanov").unwrap(),
            name: PersonName::new("ivan").unwrap(),
            surname: PersonName::new("ivanovich").unwrap(),
            phone: Phone::new(phone).unwrap(),
            department_id: department.id,
        }
    }

    #[tokio::test]
    async fn create_requires_active_user() {
        let pool = pool().await;
        let (user, department) = seed(&pool, "a@a.com").await;
        Crud::<User>::new(&pool).deactivate(user.id).await.unwrap();

        let err = EmployeeRepo::new(&pool)
            .create(new_employee(&user, &department, "111"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "user", .. }));
    }

    #[tokio::test]
    async fn create_rejects_unknown_department() {
        let pool = pool().await;
        let (user, department) = seed(&pool, "a@a.com").await;
        let mut new = new_employee(&user, &department, "111");
        new.department_id = Uuid::new_v4();

        let err = EmployeeRepo::new(&pool).create(new).await.unwrap_err();
        assert!(matches!(err, DbError::MissingReference { resource: "department", .. }));
    }

    #[tokio::test]
    async fn one_profile_per_user_and_unique_phone() {
        let pool = pool().await;
        let repo = EmployeeRepo::new(&pool);
        let (user, department) = seed(&pool, "a@a.com").await;
        let (other, _) = seed(&pool, "b@b.com").await;

        let employee = repo.create(new_employee(&user, &department, "111")).await.unwrap();
        assert_eq!(employee.short_name(), "Ivanov I.I.");

        let err = repo
            .create(new_employee(&user, &department, "222"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Key (user_id)=({}) already exists.", user.id));

        let err = repo
            .create(new_employee(&other, &department, "111"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Key (phone)=(111) already exists.");
    }

    #[tokio::test]
    async fn deactivation_hides_from_list() {
        let pool = pool().await;
        let repo = EmployeeRepo::new(&pool);
        let (user, department) = seed(&pool, "a@a.com").await;
        let employee = repo.create(new_employee(&user, &department, "111")).await.unwrap();
        assert_eq!(repo.list_active(Pagination::default()).await.unwrap().len(), 1);

        repo.deactivate_user(employee.id).await.unwrap();

        assert!(repo.list_active(Pagination::default()).await.unwrap().is_empty());
        assert!(repo.find_by_user(user.id).await.unwrap().is_some());
        assert!(matches!(
            repo.deactivate_user(Uuid::new_v4()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn partial_update_and_detail() {
        let pool = pool().await;
        let repo = EmployeeRepo::new(&pool);
        let (user, department) = seed(&pool, "a@a.com").await;
        let employee = repo.create(new_employee(&user, &department, "111")).await.unwrap();

        let updated = repo
            .update(
                employee.id,
                EmployeeChanges {
                    name: Some(PersonName::new("petr").unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Petr");
        assert_eq!(updated.phone, "111");

        let detail = repo.detail(employee.id).await.unwrap();
        assert_eq!(detail.user.id, user.id);
        assert_eq!(detail.department.id, department.id);
        assert!(detail.photo.is_none());
        assert!(detail.my_tasks.is_empty() && detail.tasks.is_empty());
    }
}
