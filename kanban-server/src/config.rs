//! Server configuration - environment loading
//!
//! Configuration is read from environment variables (a `.env` file is
//! loaded by the CLI before this runs):
//! - `DATABASE_URL`: sqlx connection string (default: sqlite://kanban.db?mode=rwc)
//! - `DB_MAX_CONNECTIONS`: pool size (default: 5)
//! - `BIND_ADDR`: listen address (default: 127.0.0.1:8000)
//! - `CORS_ORIGINS`: comma-separated allowed origins
//! - `JWT_SECRET_KEY`: HMAC secret (required)
//! - `JWT_ALGORITHM`: HS256, HS384 or HS512 (default: HS256)
//! - `JWT_ACCESS_TOKEN_EXP_DAYS` / `JWT_REFRESH_TOKEN_EXP_DAYS`: token lifetimes in days
//! - `MEDIA_ROOT`: upload directory (default: ./media)
//! - `BASE_SITE_URL`: public URL prefix for media links
//! - `CACHE_TTL_SECS`: read cache lifetime (default: 30)
//! - `MAX_UPLOAD_BYTES`: photo size limit (default: 10 MiB)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://kanban.db?mode=rwc";
/// Longest accepted token lifetime (100 years)
const MAX_TOKEN_DAYS: f64 = 36_500.0;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:8000";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {key}")]
    Missing { key: &'static str },

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Token signing settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    /// Access token lifetime in days (fractions allowed)
    pub access_ttl_days: f64,
    /// Refresh token lifetime in days (fractions allowed)
    pub refresh_ttl_days: f64,
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct KanbanConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Allow any origin (development only)
    pub cors_permissive: bool,
    pub jwt: JwtConfig,
    /// Root directory for uploaded files
    pub media_root: PathBuf,
    /// Public base URL used to build media links
    pub base_site_url: String,
    pub cache_ttl: Duration,
    pub max_upload_bytes: usize,
}

impl KanbanConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get("JWT_SECRET_KEY").ok_or(ConfigError::Missing {
            key: "JWT_SECRET_KEY",
        })?;

        let algorithm = match get("JWT_ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => Algorithm::HS256,
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_owned())
            .split(',')
            .map(|o| o.trim().to_owned())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5)?,
            bind_addr: parse_or(
                "BIND_ADDR",
                get("BIND_ADDR"),
                SocketAddr::from(([127, 0, 0, 1], 8000)),
            )?,
            cors_origins,
            cors_permissive: false,
            jwt: JwtConfig {
                secret,
                algorithm,
                access_ttl_days: parse_days(
                    "JWT_ACCESS_TOKEN_EXP_DAYS",
                    get("JWT_ACCESS_TOKEN_EXP_DAYS"),
                    1.0,
                )?,
                refresh_ttl_days: parse_days(
                    "JWT_REFRESH_TOKEN_EXP_DAYS",
                    get("JWT_REFRESH_TOKEN_EXP_DAYS"),
                    30.0,
                )?,
            },
            media_root: get("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("media")),
            base_site_url: get("BASE_SITE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8000".to_owned())
                .trim_end_matches('/')
                .to_owned(),
            cache_ttl: Duration::from_secs(parse_or("CACHE_TTL_SECS", get("CACHE_TTL_SECS"), 30)?),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), 10 * 1024 * 1024)?,
        })
    }

    /// In-memory database and a fixed secret (for testing)
    pub fn for_tests(media_root: PathBuf) -> Self {
        Self {
            database_url: "sqlite::memory:".to_owned(),
            max_connections: 1,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cors_origins: Vec::new(),
            cors_permissive: true,
            jwt: JwtConfig {
                secret: "test-secret".to_owned(),
                algorithm: Algorithm::HS256,
                access_ttl_days: 1.0,
                refresh_ttl_days: 30.0,
            },
            media_root,
            base_site_url: "http://test".to_owned(),
            cache_ttl: Duration::from_secs(30),
            max_upload_bytes: 1024 * 1024,
        }
    }

    /// Directory holding employee photos
    pub fn photos_dir(&self) -> PathBuf {
        self.media_root.join("photos")
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::Invalid {
            key: "JWT_ALGORITHM",
            value: raw.to_owned(),
            reason: "only HS256, HS384 and HS512 are supported".to_owned(),
        }),
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_days(key: &'static str, raw: Option<String>, default: f64) -> Result<f64, ConfigError> {
    let days = parse_or(key, raw, default)?;
    if !days.is_finite() || days <= 0.0 {
        return Err(ConfigError::Invalid {
            key,
            value: days.to_string(),
            reason: "must be a positive number of days".to_owned(),
        });
    }
    if days > MAX_TOKEN_DAYS {
        return Err(ConfigError::Invalid {
            key,
            value: days.to_string(),
            reason: format!("must not exceed {MAX_TOKEN_DAYS} days"),
        });
    }
    Ok(days)
}
