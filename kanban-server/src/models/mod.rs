//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod user;
pub mod employee;
pub mod title;
pub mod task;
pub mod pagination;

pub use validation::ValidationError;
pub use user::{Email, Password, UserPermission};
pub use employee::{short_name, PersonName, Phone};
pub use title::Title;
pub use task::{check_schedule, TaskPriority, TaskStatus};
pub use pagination::{Pagination, PaginationParams};
