//! Kanban board client state.
//!
//! A toolkit-independent state machine: a renderer reads [`Board::columns`],
//! [`Board::card_mode`] and the drafts, and forwards user actions to the
//! async methods. Every mutation is followed by a full refetch, which puts
//! the board back into [`BoardPhase::Loading`] until the data is back. There
//! is no optimistic update; after a failed move the refetch restores the
//! server's view.

pub mod api;
pub mod color;

pub use api::BoardApi;
pub use color::{hex_to_rgba, LabelChip};

use crate::mutation::{NewLabel, NewTask, TaskPatch};
use crate::views::{LabelNode, TaskNode};
use crate::{TaskBoardError, TaskStatus};

pub const MOVE_FAILED: &str = "Failed to move task. Please try again.";
pub const UPDATE_FAILED: &str = "Failed to update task. Please try again.";
pub const ADD_FAILED: &str = "Failed to add task. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete task. Please try again.";
pub const LABEL_FAILED: &str = "Failed to create label. Please try again.";

/// Color preselected in the label form.
pub const DEFAULT_LABEL_FORM_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardPhase {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardMode {
    Viewing,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub title: String,
    pub description: String,
    pub label_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub label_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelForm {
    pub name: String,
    pub description: String,
    pub color: String,
}

impl Default for LabelForm {
    fn default() -> Self {
        LabelForm {
            name: String::new(),
            description: String::new(),
            color: DEFAULT_LABEL_FORM_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub title: &'static str,
    pub tasks: Vec<&'a TaskNode>,
}

/// Per-status counts over all loaded tasks, ignoring the label filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardStats {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

pub fn column_title(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "To Do",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Done => "Done",
    }
}

pub struct Board<A> {
    api: A,
    phase: BoardPhase,
    tasks: Vec<TaskNode>,
    labels: Vec<LabelNode>,
    label_filter: Option<i32>,
    editing: Option<(i32, EditDraft)>,
    adding: Option<(TaskStatus, TaskDraft)>,
    label_form: LabelForm,
    alerts: Vec<String>,
}

impl<A: BoardApi> Board<A> {
    /// A board that has not fetched anything yet.
    pub fn new(api: A) -> Self {
        Board {
            api,
            phase: BoardPhase::Loading,
            tasks: Vec::new(),
            labels: Vec::new(),
            label_filter: None,
            editing: None,
            adding: None,
            label_form: LabelForm::default(),
            alerts: Vec::new(),
        }
    }

    pub fn with_label_filter(mut self, label_id: Option<i32>) -> Self {
        self.label_filter = label_id;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn phase(&self) -> &BoardPhase {
        &self.phase
    }

    pub fn tasks(&self) -> &[TaskNode] {
        &self.tasks
    }

    pub fn labels(&self) -> &[LabelNode] {
        &self.labels
    }

    pub fn label_filter(&self) -> Option<i32> {
        self.label_filter
    }

    pub fn set_label_filter(&mut self, label_id: Option<i32>) {
        self.label_filter = label_id;
    }

    /// Refetch tasks and labels.
    ///
    /// A task fetch failure fails the board; a label fetch failure keeps the
    /// previous labels.
    pub async fn refresh(&mut self) {
        self.phase = BoardPhase::Loading;

        match self.api.tasks().await {
            Ok(tasks) => self.tasks = tasks,
            Err(err) => {
                log::error!("Error loading tasks: {err}");
                self.phase = BoardPhase::Failed(err.to_string());
                return;
            }
        }
        match self.api.labels().await {
            Ok(labels) => self.labels = labels,
            Err(err) => log::warn!("Error loading labels: {err}"),
        }

        if let Some((id, _)) = &self.editing {
            if !self.tasks.iter().any(|t| t.id == *id) {
                self.editing = None;
            }
        }
        self.phase = BoardPhase::Ready;
    }

    /// The three status columns, filtered by the label filter.
    pub fn columns(&self) -> Vec<Column<'_>> {
        TaskStatus::ALL
            .into_iter()
            .map(|status| Column {
                status,
                title: column_title(status),
                tasks: self
                    .tasks
                    .iter()
                    .filter(|t| t.status == status)
                    .filter(|t| self.label_filter.is_none() || t.label_id == self.label_filter)
                    .collect(),
            })
            .collect()
    }

    pub fn stats(&self) -> BoardStats {
        self.tasks
            .iter()
            .fold(BoardStats::default(), |mut stats, task| {
                match task.status {
                    TaskStatus::Todo => stats.todo += 1,
                    TaskStatus::InProgress => stats.in_progress += 1,
                    TaskStatus::Done => stats.done += 1,
                }
                stats
            })
    }

    /// Handle the end of a drag. Dropping outside any column does nothing.
    pub async fn drop_card(&mut self, task_id: i32, destination: Option<TaskStatus>) {
        let Some(destination) = destination else {
            return;
        };
        if let Err(err) = self
            .api
            .update_task_status(task_id, destination.as_str())
            .await
        {
            self.alert(MOVE_FAILED, &err);
        }
        self.refresh().await;
    }

    pub fn card_mode(&self, task_id: i32) -> CardMode {
        match &self.editing {
            Some((id, _)) if *id == task_id => CardMode::Editing,
            _ => CardMode::Viewing,
        }
    }

    /// Switch a card to editing, seeding the draft from the loaded task.
    /// Any other card being edited goes back to viewing.
    pub fn begin_edit(&mut self, task_id: i32) -> bool {
        let Some(task) = self.tasks.iter().find(|t| t.id == task_id) else {
            return false;
        };
        let draft = EditDraft {
            title: task.title.clone(),
            description: task.description.clone(),
            label_id: task.label_id,
        };
        self.editing = Some((task_id, draft));
        true
    }

    pub fn edit_draft(&self) -> Option<&EditDraft> {
        self.editing.as_ref().map(|(_, draft)| draft)
    }

    pub fn edit_draft_mut(&mut self) -> Option<&mut EditDraft> {
        self.editing.as_mut().map(|(_, draft)| draft)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Send the edit draft. On failure the card stays in editing mode.
    pub async fn save_edit(&mut self) -> bool {
        let Some((id, draft)) = self.editing.clone() else {
            return false;
        };
        let patch = TaskPatch {
            title: Some(draft.title),
            description: Some(draft.description),
            status: None,
            label_id: Some(draft.label_id),
        };
        let saved = match self.api.update_task_details(id, patch).await {
            Ok(_) => {
                self.editing = None;
                true
            }
            Err(err) => {
                self.alert(UPDATE_FAILED, &err);
                false
            }
        };
        self.refresh().await;
        saved
    }

    /// Open the add-task dialog for a column.
    pub fn open_new_task(&mut self, status: TaskStatus) {
        self.adding = Some((status, TaskDraft::default()));
    }

    pub fn new_task_status(&self) -> Option<TaskStatus> {
        self.adding.as_ref().map(|(status, _)| *status)
    }

    pub fn new_task_draft_mut(&mut self) -> Option<&mut TaskDraft> {
        self.adding.as_mut().map(|(_, draft)| draft)
    }

    pub fn cancel_new_task(&mut self) {
        self.adding = None;
    }

    /// Create the drafted task. Blank titles are ignored; on failure the
    /// dialog stays open.
    pub async fn submit_new_task(&mut self) -> bool {
        let Some((status, draft)) = self.adding.clone() else {
            return false;
        };
        if draft.title.trim().is_empty() {
            return false;
        }
        let input = NewTask {
            title: draft.title,
            description: draft.description,
            status: Some(status.as_str().to_string()),
            label_id: draft.label_id,
        };
        let added = match self.api.add_task(input).await {
            Ok(task) => {
                log::debug!("Added task {}", task.id);
                self.adding = None;
                true
            }
            Err(err) => {
                self.alert(ADD_FAILED, &err);
                false
            }
        };
        self.refresh().await;
        added
    }

    /// Delete a card. The caller is expected to have confirmed with the user.
    pub async fn delete_card(&mut self, task_id: i32) -> bool {
        let deleted = match self.api.delete_task(task_id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                self.alert(DELETE_FAILED, &err);
                false
            }
        };
        self.refresh().await;
        deleted
    }

    pub fn label_form(&self) -> &LabelForm {
        &self.label_form
    }

    pub fn label_form_mut(&mut self) -> &mut LabelForm {
        &mut self.label_form
    }

    /// Create a label from the form. Blank names are ignored; the form resets
    /// on success.
    pub async fn submit_label(&mut self) -> bool {
        let form = self.label_form.clone();
        if form.name.trim().is_empty() {
            return false;
        }
        let input = NewLabel {
            name: form.name,
            description: (!form.description.is_empty()).then_some(form.description),
            color: Some(form.color),
        };
        let created = match self.api.add_label(input).await {
            Ok(_) => {
                self.label_form = LabelForm::default();
                true
            }
            Err(err) => {
                self.alert(LABEL_FAILED, &err);
                false
            }
        };
        self.refresh().await;
        created
    }

    pub fn label_chip(&self, task: &TaskNode) -> Option<LabelChip> {
        task.label.as_ref().map(LabelChip::for_label)
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    fn alert(&mut self, message: &str, err: &TaskBoardError) {
        log::error!("{message} ({err})");
        self.alerts.push(message.to_string());
    }
}
