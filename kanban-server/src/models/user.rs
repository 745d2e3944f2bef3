//! Account-level value types: email, password, permission

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::check_length;
use super::ValidationError;

/// Maximum length for email addresses (column width)
const MAX_EMAIL_LEN: usize = 50;

/// Maximum accepted password length before hashing
const MAX_PASSWORD_LEN: usize = 128;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("invalid email regex")
});

/// Validated email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Create an email, trimming surrounding whitespace.
    ///
    /// # Example
    /// ```
    /// use kanban_server::models::Email;
    ///
    /// assert!(Email::new("user@user.com").is_ok());
    /// assert!(Email::new("user.com").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        check_length("email", s, MAX_EMAIL_LEN)?;

        if !EMAIL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "value is not a valid email address",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plain-text password accepted from a client, before hashing
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        check_length("password", s, MAX_PASSWORD_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Keep secrets out of logs
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserPermission {
    Admin,
    Moderator,
    User,
    #[default]
    None,
}

impl UserPermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::User => "user",
            Self::None => "none",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Moderator => "Moderator",
            Self::User => "User",
            Self::None => "No permissions",
        }
    }

    /// Any granted role may use member endpoints.
    pub fn is_member(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn is_moderator(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserPermission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "moderator" => Ok(Self::Moderator),
            "user" => Ok(Self::User),
            "none" => Ok(Self::None),
            _ => Err(ValidationError::InvalidVariant {
                field: "permission",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_accepts_common_addresses() {
        assert!(Email::new("admin@admin.com").is_ok());
        assert!(Email::new("first.last+tag@mail.example.org").is_ok());
        assert_eq!(Email::new("  user@user.com ").unwrap().as_str(), "user@user.com");
    }

    #[test]
    fn email_rejects_garbage() {
        assert!(Email::new("").is_err());
        assert!(Email::new("user").is_err());
        assert!(Email::new("user@host").is_err());
        assert!(Email::new("us er@host.com").is_err());
        let long = format!("{}@example.com", "a".repeat(60));
        assert!(matches!(
            Email::new(&long),
            Err(ValidationError::TooLong { field: "email", max: 50 })
        ));
    }

    #[test]
    fn password_debug_is_redacted() {
        let p = Password::new("12345").unwrap();
        assert_eq!(format!("{:?}", p), "Password(***)");
        assert!(Password::new("").is_err());
    }

    #[test]
    fn permission_levels() {
        assert!(!UserPermission::None.is_member());
        assert!(UserPermission::User.is_member());
        assert!(!UserPermission::User.is_moderator());
        assert!(UserPermission::Moderator.is_moderator());
        assert!(UserPermission::Admin.is_moderator());
        assert!(!UserPermission::Moderator.is_admin());
    }

    #[test]
    fn permission_parses_case_insensitively() {
        assert_eq!("Admin".parse::<UserPermission>().unwrap(), UserPermission::Admin);
        assert!("root".parse::<UserPermission>().is_err());
    }

    #[test]
    fn permission_serializes_lowercase() {
        let json = serde_json::to_string(&UserPermission::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");
    }
}
