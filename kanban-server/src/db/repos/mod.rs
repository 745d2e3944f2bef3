//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Generic reads and deletes go through `Crud<E>`
//! - Handles conflicts via constraints (no check-then-insert for uniqueness)
//! - Uses transactions for multi-step operations

pub mod crud;
pub mod users;
pub mod departments;
pub mod employees;
pub mod photos;
pub mod projects;
pub mod tasks;

pub use crud::{Crud, Entity, SoftDelete};
pub use users::{User, UserChanges, UserRepo};
pub use departments::{Department, DepartmentDetail, DepartmentRepo};
pub use employees::{Employee, EmployeeChanges, EmployeeDetail, EmployeeRepo, NewEmployee};
pub use photos::{Photo, PhotoChanges, PhotoRepo};
pub use projects::{Project, ProjectChanges, ProjectDetail, ProjectRepo};
pub use tasks::{NewTask, Task, TaskChanges, TaskDetail, TaskRepo, TaskWithLinks};
