//! SeaORM entities backing the store.
//!
//! `task_label` must be created before `task`: `tasks.label_id` references
//! `task_labels.id` with `ON DELETE SET NULL`.

pub mod task;
pub mod task_label;
pub mod user_preferences;

use sea_orm::ActiveValue;

use crate::TaskBoardError;

/// The value an active model will write for a column, if any.
pub(crate) fn written<V>(value: &ActiveValue<V>) -> Option<&V>
where
    V: Into<sea_orm::Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

/// Reject `value` if it is longer than `max` characters.
pub(crate) fn check_max_len(
    table: &str,
    column: &str,
    value: &str,
    max: usize,
) -> Result<(), TaskBoardError> {
    let len = value.chars().count();
    if len > max {
        return Err(TaskBoardError::ConstraintViolation(format!(
            "{table}.{column} is {len} characters long, maximum is {max}"
        )));
    }
    Ok(())
}

/// Reject a required column that an insert would leave unset.
pub(crate) fn check_required<V>(
    table: &str,
    column: &str,
    value: &ActiveValue<V>,
    inserting: bool,
) -> Result<(), TaskBoardError>
where
    V: Into<sea_orm::Value>,
{
    if inserting && written(value).is_none() {
        return Err(TaskBoardError::ConstraintViolation(format!(
            "{table}.{column} is required"
        )));
    }
    Ok(())
}
