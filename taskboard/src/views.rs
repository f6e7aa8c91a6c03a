//! API-facing shapes of the stored rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{task, task_label, user_preferences};
use crate::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Derived from `status`.
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub label_id: Option<i32>,
    /// `None` when unlabelled or when the referenced label no longer exists.
    pub label: Option<LabelNode>,
}

impl TaskNode {
    pub(crate) fn from_models(task: task::Model, label: Option<task_label::Model>) -> Self {
        let status = TaskStatus::from_stored(&task.status);
        TaskNode {
            id: task.id,
            title: task.title,
            description: task.description,
            status,
            is_completed: status == TaskStatus::Done,
            created_at: task.created_at,
            completed_at: task.completed_at,
            last_modified: task.last_modified,
            label_id: task.label_id,
            label: label.map(LabelNode::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelNode {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl From<task_label::Model> for LabelNode {
    fn from(label: task_label::Model) -> Self {
        LabelNode {
            id: label.id,
            name: label.name,
            description: label.description,
            color: label.color,
            created_at: label.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferencesNode {
    pub id: i32,
    pub user_id: String,
    pub theme: String,
    pub language: String,
    pub email_notifications: bool,
    pub last_updated: DateTime<Utc>,
}

impl From<user_preferences::Model> for UserPreferencesNode {
    fn from(prefs: user_preferences::Model) -> Self {
        UserPreferencesNode {
            id: prefs.id,
            user_id: prefs.user_id,
            theme: prefs.theme,
            language: prefs.language,
            email_notifications: prefs.email_notifications,
            last_updated: prefs.last_updated,
        }
    }
}
