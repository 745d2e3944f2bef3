//! Employee field validation: person names and phone numbers

use super::validation::check_length;
use super::ValidationError;

/// Maximum length for family/name/surname
const MAX_NAME_LEN: usize = 100;

/// Maximum length for phone numbers (column width)
const MAX_PHONE_LEN: usize = 12;

/// Field label shared by all three name parts
const NAME_FIELD: &str = "family, name or surname";

/// A single alphabetic name part, stored capitalized ("ivanov" -> "Ivanov").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    /// # Example
    /// ```
    /// use kanban_server::models::PersonName;
    ///
    /// assert_eq!(PersonName::new("pETROV").unwrap().as_str(), "Petrov");
    /// assert!(PersonName::new("Name2000").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() || !s.chars().all(char::is_alphabetic) {
            return Err(ValidationError::InvalidValue { field: NAME_FIELD });
        }
        check_length(NAME_FIELD, s, MAX_NAME_LEN)?;

        Ok(Self(capitalize(s)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number: digits, letters and `+`; no other punctuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phone(String);

impl Phone {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        check_length("phone", s, MAX_PHONE_LEN)?;

        let only_letters = s.chars().all(char::is_alphabetic);
        let has_punctuation = s.chars().any(|c| c.is_ascii_punctuation() && c != '+');
        if only_letters || has_punctuation {
            return Err(ValidationError::InvalidValue { field: "phone" });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Short display form: "Family N.S."
pub fn short_name(family: &str, name: &str, surname: &str) -> String {
    let first = |s: &str| s.chars().next().map(String::from).unwrap_or_default();
    format!("{} {}.{}.", family, first(name), first(surname))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_capitalized() {
        assert_eq!(PersonName::new("admin").unwrap().as_str(), "Admin");
        assert_eq!(PersonName::new("ИВАНОВ").unwrap().as_str(), "Иванов");
    }

    #[test]
    fn names_reject_non_letters() {
        for bad in ["", "Name2000", "New Name", "o'brien"] {
            assert_eq!(
                PersonName::new(bad),
                Err(ValidationError::InvalidValue { field: NAME_FIELD }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn phone_rules() {
        assert!(Phone::new("12345").is_ok());
        assert!(Phone::new("+4545454").is_ok());
        assert_eq!(
            Phone::new("phone"),
            Err(ValidationError::InvalidValue { field: "phone" })
        );
        assert!(Phone::new("123-456").is_err());
        assert!(Phone::new("(123)456").is_err());
        assert!(matches!(
            Phone::new("+1234567890123"),
            Err(ValidationError::TooLong { field: "phone", .. })
        ));
    }

    #[test]
    fn short_name_uses_initials() {
        assert_eq!(short_name("Model", "Model", "Model"), "Model M.M.");
    }
}
