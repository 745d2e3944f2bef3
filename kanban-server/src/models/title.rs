//! Title validation shared by departments, projects and tasks

use std::fmt;

use super::validation::check_length;
use super::ValidationError;

/// Maximum length for titles (column width)
const MAX_TITLE_LEN: usize = 100;

/// Validated, trimmed title
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Title(String);

impl Title {
    /// # Example
    /// ```
    /// use kanban_server::models::Title;
    ///
    /// assert_eq!(Title::new("  Project1 ").unwrap().as_str(), "Project1");
    /// assert!(Title::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        check_length("title", s, MAX_TITLE_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlong_titles() {
        assert!(Title::new(&"x".repeat(100)).is_ok());
        assert_eq!(
            Title::new(&"x".repeat(101)),
            Err(ValidationError::TooLong {
                field: "title",
                max: 100
            })
        );
    }
}
