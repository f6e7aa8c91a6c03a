//! Task workflow status.
//!
//! Stored as its canonical upper-case name in the `tasks.status` column and
//! exchanged on the wire in the same form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TaskBoardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub const fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Parse a status name case-insensitively.
    ///
    /// `operation` is the calling API operation; it ends up in the error message
    /// together with the offending value.
    pub fn parse(raw: &str, operation: &'static str) -> Result<Self, TaskBoardError> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                TaskBoardError::validation(
                    operation,
                    format!("invalid task status '{raw}', expected one of TODO, IN_PROGRESS, DONE"),
                )
            })
    }

    /// Decode a value read back from storage. Unknown values fall back to TODO.
    pub(crate) fn from_stored(raw: &str) -> Self {
        Self::parse(raw, "load").unwrap_or_else(|_| {
            log::warn!("Unknown stored task status {raw:?}, treating as TODO");
            TaskStatus::Todo
        })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any_case() {
        assert_eq!(TaskStatus::parse("todo", "addTask").unwrap(), TaskStatus::Todo);
        assert_eq!(
            TaskStatus::parse("In_Progress", "addTask").unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(TaskStatus::parse(" DONE ", "addTask").unwrap(), TaskStatus::Done);
    }

    #[test]
    fn rejects_unknown_value_with_context() {
        let err = TaskStatus::parse("IN PROGRESS", "updateTaskStatus").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("updateTaskStatus:"));
        assert!(message.contains("'IN PROGRESS'"));
    }

    #[test]
    fn serializes_to_canonical_name() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
