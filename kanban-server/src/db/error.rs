//! Database error type and constraint classification

use sqlx::error::ErrorKind;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Unique constraint violation, worded like the Postgres detail line
    #[error("Key ({column})=({value}) already exists.")]
    Duplicate { column: String, value: String },

    /// A referenced row does not exist
    #[error("{resource} '{id}' does not exist")]
    MissingReference { resource: &'static str, id: String },

    /// Row is still referenced by other rows
    #[error("{resource} is still referenced by other records")]
    StillReferenced { resource: &'static str },
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn missing_reference(resource: &'static str, id: impl ToString) -> Self {
        Self::MissingReference {
            resource,
            id: id.to_string(),
        }
    }

    /// Classify a failed INSERT/UPDATE.
    ///
    /// `values` maps column names to the values that were written, so a
    /// unique violation can report which value collided.
    pub fn from_write(err: sqlx::Error, resource: &'static str, values: &[(&str, &str)]) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    let column = violated_column(db_err.message()).unwrap_or("id").to_owned();
                    let value = values
                        .iter()
                        .find(|(c, _)| *c == column)
                        .map(|(_, v)| (*v).to_owned())
                        .unwrap_or_default();
                    return Self::Duplicate { column, value };
                }
                ErrorKind::ForeignKeyViolation => {
                    return Self::MissingReference {
                        resource,
                        id: "referenced row".to_owned(),
                    };
                }
                _ => {}
            }
        }
        Self::Sqlx(err)
    }

    /// Classify a failed DELETE.
    pub fn from_delete(err: sqlx::Error, resource: &'static str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if matches!(db_err.kind(), ErrorKind::ForeignKeyViolation) {
                return Self::StillReferenced { resource };
            }
        }
        Self::Sqlx(err)
    }
}

/// Extract the column from "UNIQUE constraint failed: users.email".
///
/// Composite constraints list several columns; the first one is reported.
fn violated_column(message: &str) -> Option<&str> {
    let (_, detail) = message.split_once("constraint failed:")?;
    let first = detail.split(',').next()?.trim();
    Some(first.rsplit('.').next().unwrap_or(first))
}
