//! kanban-server: HTTP API for a small Kanban task manager
//!
//! Accounts with roles, departments, employee profiles, projects, tasks and
//! employee photos over a SQLite store, with JWT authentication and a short
//! lived read cache.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod http;
pub mod media;
pub mod models;

pub use config::{ConfigError, JwtConfig, KanbanConfig};
pub use http::{build_router, run_server, AppState, ServerError};
