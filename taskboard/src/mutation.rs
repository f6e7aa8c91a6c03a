//! Write operations.
//!
//! Every operation opens one [`Session`](crate::Session), performs its
//! read-modify-write inside it and commits at the end. Early returns drop the
//! session, which rolls back.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::connection::TaskBoardDb;
use crate::entity::{task, task_label, user_preferences};
use crate::messages::WriteKind;
use crate::views::{LabelNode, TaskNode, UserPreferencesNode};
use crate::{TaskBoardError, TaskStatus};

const TASKS: &str = "tasks";
const LABELS: &str = "task_labels";
const PREFERENCES: &str = "user_preferences";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    /// Status name, parsed case-insensitively. Defaults to TODO.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_id: Option<i32>,
}

/// Input of the legacy `updateTask` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update of a task. `None` leaves a field unchanged.
///
/// `label_id` is tri-state: `None` keeps the label, `Some(None)` clears it,
/// `Some(Some(id))` assigns one. On the wire an absent `labelId` key is
/// `None` and an explicit `null` is `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub label_id: Option<Option<i32>>,
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLabel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hex color, defaults to `#CCCCCC`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesInput {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
}

impl PreferencesInput {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            theme: None,
            language: None,
            email_notifications: None,
        }
    }
}

pub struct Mutations<'a> {
    db: &'a TaskBoardDb,
}

impl<'a> Mutations<'a> {
    pub(crate) fn new(db: &'a TaskBoardDb) -> Self {
        Self { db }
    }

    pub async fn add_task(&self, input: NewTask) -> Result<TaskNode, TaskBoardError> {
        let status = match input.status.as_deref() {
            Some(raw) => TaskStatus::parse(raw, "addTask")?,
            None => TaskStatus::default(),
        };

        let mut session = self.db.session().await?;
        let model = task::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            status: Set(status.as_str().to_string()),
            created_at: Set(Utc::now()),
            completed_at: Set(None),
            last_modified: Set(None),
            label_id: Set(input.label_id),
            ..Default::default()
        };
        model.check_constraints(true)?;
        let task = model.insert(session.conn()).await?;
        session.record(TASKS, WriteKind::Insert, task.id);

        let node = with_label(session.conn(), task).await?;
        session.commit().await?;
        log::debug!("Created task {} in {}", node.id, node.status);
        Ok(node)
    }

    /// Legacy completion toggle. Returns `None` when the task does not exist.
    ///
    /// Completing moves the task to DONE and stamps `completed_at`; reopening
    /// moves a DONE task back to TODO and clears `completed_at`.
    pub async fn update_task(
        &self,
        id: i32,
        update: LegacyTaskUpdate,
    ) -> Result<Option<TaskNode>, TaskBoardError> {
        let mut session = self.db.session().await?;
        let Some(task) = task::Entity::find_by_id(id).one(session.conn()).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let current = TaskStatus::from_stored(&task.status);
        let mut active: task::ActiveModel = task.into();
        if let Some(title) = update.title {
            active.title = Set(title);
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        match update.is_completed {
            Some(true) => {
                active.status = Set(TaskStatus::Done.as_str().to_string());
                active.completed_at = Set(Some(now));
            }
            Some(false) => {
                if current == TaskStatus::Done {
                    active.status = Set(TaskStatus::Todo.as_str().to_string());
                }
                active.completed_at = Set(None);
            }
            None => {}
        }
        active.last_modified = Set(Some(now));
        active.check_constraints(false)?;

        let task = active.update(session.conn()).await?;
        session.record(TASKS, WriteKind::Update, task.id);
        let node = with_label(session.conn(), task).await?;
        session.commit().await?;
        Ok(Some(node))
    }

    /// Move a task to another status. Leaves `completed_at` alone.
    pub async fn update_task_status(&self, id: i32, status: &str) -> Result<TaskNode, TaskBoardError> {
        let status = TaskStatus::parse(status, "updateTaskStatus")?;

        let mut session = self.db.session().await?;
        let task = task::Entity::find_by_id(id)
            .one(session.conn())
            .await?
            .ok_or_else(|| TaskBoardError::not_found("Task", id))?;

        let mut active: task::ActiveModel = task.into();
        active.status = Set(status.as_str().to_string());
        active.last_modified = Set(Some(Utc::now()));

        let task = active.update(session.conn()).await?;
        session.record(TASKS, WriteKind::Update, task.id);
        let node = with_label(session.conn(), task).await?;
        session.commit().await?;
        log::debug!("Moved task {id} to {status}");
        Ok(node)
    }

    /// Apply the fields present in `patch`.
    pub async fn update_task_details(
        &self,
        id: i32,
        patch: TaskPatch,
    ) -> Result<TaskNode, TaskBoardError> {
        let status = patch
            .status
            .as_deref()
            .map(|raw| TaskStatus::parse(raw, "updateTaskDetails"))
            .transpose()?;

        let mut session = self.db.session().await?;
        let task = task::Entity::find_by_id(id)
            .one(session.conn())
            .await?
            .ok_or_else(|| TaskBoardError::not_found("Task", id))?;

        let mut active: task::ActiveModel = task.into();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(status) = status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(label_id) = patch.label_id {
            active.label_id = Set(label_id);
        }
        active.last_modified = Set(Some(Utc::now()));
        active.check_constraints(false)?;

        let task = active.update(session.conn()).await?;
        session.record(TASKS, WriteKind::Update, task.id);
        let node = with_label(session.conn(), task).await?;
        session.commit().await?;
        Ok(node)
    }

    /// Remove a task. `false` if there was nothing to remove.
    pub async fn delete_task(&self, id: i32) -> Result<bool, TaskBoardError> {
        let mut session = self.db.session().await?;
        let result = task::Entity::delete_by_id(id).exec(session.conn()).await?;
        let deleted = result.rows_affected > 0;
        if deleted {
            session.record(TASKS, WriteKind::Delete, id);
        }
        session.commit().await?;
        log::debug!("Delete task {id}: removed={deleted}");
        Ok(deleted)
    }

    pub async fn add_label(&self, input: NewLabel) -> Result<LabelNode, TaskBoardError> {
        let mut session = self.db.session().await?;
        let model = task_label::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            color: Set(input
                .color
                .unwrap_or_else(|| task_label::DEFAULT_COLOR.to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model.check_constraints(true)?;
        let label = model.insert(session.conn()).await?;
        session.record(LABELS, WriteKind::Insert, label.id);
        session.commit().await?;
        log::debug!("Created label {} ({})", label.id, label.name);
        Ok(label.into())
    }

    /// Assign or clear a task's label. Whether `label_id` exists is left to
    /// the foreign key.
    pub async fn set_task_label(
        &self,
        task_id: i32,
        label_id: Option<i32>,
    ) -> Result<TaskNode, TaskBoardError> {
        let mut session = self.db.session().await?;
        let task = task::Entity::find_by_id(task_id)
            .one(session.conn())
            .await?
            .ok_or_else(|| TaskBoardError::not_found("Task", task_id))?;

        let mut active: task::ActiveModel = task.into();
        active.label_id = Set(label_id);
        active.last_modified = Set(Some(Utc::now()));

        let task = active.update(session.conn()).await?;
        session.record(TASKS, WriteKind::Update, task.id);
        let node = with_label(session.conn(), task).await?;
        session.commit().await?;
        Ok(node)
    }

    /// Insert preferences for a new user with defaults for missing fields, or
    /// merge the provided fields into the existing row.
    ///
    /// The lookup and the insert are not guarded by a unique index: two
    /// concurrent first calls for one user can both insert.
    pub async fn add_or_update_user_preferences(
        &self,
        input: PreferencesInput,
    ) -> Result<UserPreferencesNode, TaskBoardError> {
        let mut session = self.db.session().await?;
        let existing = user_preferences::Entity::find()
            .filter(user_preferences::Column::UserId.eq(input.user_id.as_str()))
            .order_by_asc(user_preferences::Column::Id)
            .one(session.conn())
            .await?;
        let now = Utc::now();

        let (prefs, kind) = match existing {
            None => {
                let model = user_preferences::ActiveModel {
                    user_id: Set(input.user_id),
                    theme: Set(input
                        .theme
                        .unwrap_or_else(|| user_preferences::DEFAULT_THEME.to_string())),
                    language: Set(input
                        .language
                        .unwrap_or_else(|| user_preferences::DEFAULT_LANGUAGE.to_string())),
                    email_notifications: Set(input
                        .email_notifications
                        .unwrap_or(user_preferences::DEFAULT_EMAIL_NOTIFICATIONS)),
                    last_updated: Set(now),
                    ..Default::default()
                };
                model.check_constraints(true)?;
                (model.insert(session.conn()).await?, WriteKind::Insert)
            }
            Some(prefs) => {
                let mut active: user_preferences::ActiveModel = prefs.into();
                if let Some(theme) = input.theme {
                    active.theme = Set(theme);
                }
                if let Some(language) = input.language {
                    active.language = Set(language);
                }
                if let Some(enabled) = input.email_notifications {
                    active.email_notifications = Set(enabled);
                }
                active.last_updated = Set(now);
                active.check_constraints(false)?;
                (active.update(session.conn()).await?, WriteKind::Update)
            }
        };

        session.record(PREFERENCES, kind, prefs.id);
        session.commit().await?;
        Ok(prefs.into())
    }

    /// Delete every task and every label. No confirmation, no undo.
    pub async fn clear_all_data(&self) -> Result<bool, TaskBoardError> {
        let mut session = self.db.session().await?;
        let tasks = task::Entity::delete_many().exec(session.conn()).await?;
        let labels = task_label::Entity::delete_many()
            .exec(session.conn())
            .await?;
        session.record(TASKS, WriteKind::Delete, "");
        session.record(LABELS, WriteKind::Delete, "");
        session.commit().await?;
        log::warn!(
            "Cleared all data: {} tasks and {} labels removed",
            tasks.rows_affected,
            labels.rows_affected
        );
        Ok(true)
    }
}

async fn with_label<C>(conn: &C, task: task::Model) -> Result<TaskNode, TaskBoardError>
where
    C: ConnectionTrait,
{
    let label = match task.label_id {
        Some(label_id) => task_label::Entity::find_by_id(label_id).one(conn).await?,
        None => None,
    };
    Ok(TaskNode::from_models(task, label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_missing_and_null_label() {
        let missing: TaskPatch = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert_eq!(missing.label_id, None);

        let cleared: TaskPatch = serde_json::from_str(r#"{"labelId":null}"#).unwrap();
        assert_eq!(cleared.label_id, Some(None));

        let assigned: TaskPatch = serde_json::from_str(r#"{"labelId":4}"#).unwrap();
        assert_eq!(assigned.label_id, Some(Some(4)));
    }

    #[test]
    fn patch_serializes_explicit_clear() {
        let patch = TaskPatch {
            label_id: Some(None),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"labelId":null}"#);
        assert_eq!(serde_json::to_string(&TaskPatch::default()).unwrap(), "{}");
    }
}
