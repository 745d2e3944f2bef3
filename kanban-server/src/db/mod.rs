//! Database layer - connection pool, schema and repositories
//!
//! # Design Principles
//!
//! - Connection pool - no Arc<Mutex<Connection>>
//! - Rely on DB constraints, handle conflicts - no check-then-insert for uniqueness
//! - Transactions for multi-step operations (task + link tables)
//! - Generic CRUD in one place, entity-specific writes in each repo

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use error::DbError;
pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
