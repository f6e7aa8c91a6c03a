use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskBoardError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{operation}: {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database operation failed: {0}")]
    Database(DbErr),

    #[error("Transport failed: {0}")]
    Transport(String),
}

impl TaskBoardError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        TaskBoardError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        TaskBoardError::Validation {
            operation,
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used in API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            TaskBoardError::NotFound { .. } => "NOT_FOUND",
            TaskBoardError::Validation { .. } => "VALIDATION_ERROR",
            TaskBoardError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            TaskBoardError::Database(_) | TaskBoardError::Transport(_) => "INTERNAL_ERROR",
        }
    }
}

// SQLite reports FK, NOT NULL and CHECK failures as "... constraint failed";
// only unique and FK violations get a typed `SqlErr`.
impl From<DbErr> for TaskBoardError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                return TaskBoardError::ConstraintViolation(msg);
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return TaskBoardError::ConstraintViolation(msg);
            }
            _ => {}
        }
        let text = err.to_string();
        if text.contains("constraint failed") {
            TaskBoardError::ConstraintViolation(text)
        } else {
            TaskBoardError::Database(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_operation() {
        let err = TaskBoardError::validation("updateTaskStatus", "invalid status 'LATER'");
        assert_eq!(err.to_string(), "updateTaskStatus: invalid status 'LATER'");
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn sqlite_constraint_text_is_classified() {
        let err = TaskBoardError::from(DbErr::Custom(
            "NOT NULL constraint failed: tasks.title".into(),
        ));
        assert!(matches!(err, TaskBoardError::ConstraintViolation(_)));

        let err = TaskBoardError::from(DbErr::Custom("disk I/O error".into()));
        assert!(matches!(err, TaskBoardError::Database(_)));
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
