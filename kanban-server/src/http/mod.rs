//! HTTP layer - axum router, extractors, permission gates and routes

pub mod error;
pub mod extractors;
pub mod permissions;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerError};
