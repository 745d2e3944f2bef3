//! Task workflow enums and schedule validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Kanban column of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Planned
    #[default]
    Todo,
    /// In progress
    Doing,
    /// Waiting for review
    Done,
    /// Finished
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskPriority {
    // Older clients send the misspelled "height"
    #[serde(alias = "height")]
    High,
    Normal,
    Low,
    #[default]
    None,
}

/// Reject schedules that end before they start.
pub fn check_schedule(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::Inconsistent {
            reason: "task end must not precede its start",
        }),
        _ => Ok(()),
    }
}
