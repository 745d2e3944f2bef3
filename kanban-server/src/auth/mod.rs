//! Authentication: token issuance/verification and password hashing
//!
//! Permission gates that turn a request into an authorized user live in
//! `http::permissions`; this module has no HTTP dependencies.

pub mod jwt;
pub mod password;

pub use jwt::{Claims, TokenMode, TokenPair, TokenService};
pub use password::{hash_password, verify_password};

/// Authentication and authorization failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable `Authorization` header
    #[error("Not authenticated")]
    MissingToken,

    /// Bad token, bad login, or the account is unknown/inactive
    #[error("Invalid authorization credentials")]
    InvalidCredentials,

    /// Authenticated, but the role is too low
    #[error("Don't have permissions")]
    Forbidden,

    /// Task edits are limited to the author (and moderators)
    #[error("Can't change task, where you are not author")]
    NotOwner,

    /// Token expiry falls outside the representable time range
    #[error("token lifetime is out of range")]
    Lifetime,

    /// Signing a token failed
    #[error("token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Hashing failed or the blocking task was lost
    #[error("password hashing failed: {0}")]
    Hash(String),
}
