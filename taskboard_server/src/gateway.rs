//! Named-operation dispatch over a [`TaskBoardDb`].
//!
//! A request names one operation and carries its arguments as a JSON object.
//! The reply follows the GraphQL response shape: the result sits under
//! `data.<operationName>`, failures are listed in `errors` with a machine
//! readable `extensions.code`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use taskboard::{
    LegacyTaskUpdate, ListArgs, NewLabel, NewTask, PreferencesInput, TaskBoardDb, TaskBoardError,
    TaskPatch,
};

/// Message sent in place of constraint and database errors when details are
/// hidden.
pub const GENERIC_ERROR_MESSAGE: &str = "Unexpected Execution Error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRequest {
    pub operation_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<JsonValue>,
}

impl GraphRequest {
    pub fn new(operation_name: impl Into<String>, variables: JsonValue) -> Self {
        Self {
            operation_name: operation_name.into(),
            variables: Some(variables),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphResponse {
    pub data: JsonValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphError {
    pub message: String,
    pub path: Vec<String>,
    pub extensions: ErrorExtensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Tasks,
    TaskById,
    UserPreferences,
    UserPreferencesByUserId,
    Labels,
    LabelTasks,
    AddTask,
    UpdateTask,
    UpdateTaskStatus,
    UpdateTaskDetails,
    DeleteTask,
    AddLabel,
    SetTaskLabel,
    AddOrUpdateUserPreferences,
    ClearAllData,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::Tasks,
        Operation::TaskById,
        Operation::UserPreferences,
        Operation::UserPreferencesByUserId,
        Operation::Labels,
        Operation::LabelTasks,
        Operation::AddTask,
        Operation::UpdateTask,
        Operation::UpdateTaskStatus,
        Operation::UpdateTaskDetails,
        Operation::DeleteTask,
        Operation::AddLabel,
        Operation::SetTaskLabel,
        Operation::AddOrUpdateUserPreferences,
        Operation::ClearAllData,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Tasks => "tasks",
            Operation::TaskById => "taskById",
            Operation::UserPreferences => "userPreferences",
            Operation::UserPreferencesByUserId => "userPreferencesByUserId",
            Operation::Labels => "labels",
            Operation::LabelTasks => "labelTasks",
            Operation::AddTask => "addTask",
            Operation::UpdateTask => "updateTask",
            Operation::UpdateTaskStatus => "updateTaskStatus",
            Operation::UpdateTaskDetails => "updateTaskDetails",
            Operation::DeleteTask => "deleteTask",
            Operation::AddLabel => "addLabel",
            Operation::SetTaskLabel => "setTaskLabel",
            Operation::AddOrUpdateUserPreferences => "addOrUpdateUserPreferences",
            Operation::ClearAllData => "clearAllData",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn is_mutation(self) -> bool {
        !matches!(
            self,
            Operation::Tasks
                | Operation::TaskById
                | Operation::UserPreferences
                | Operation::UserPreferencesByUserId
                | Operation::Labels
                | Operation::LabelTasks
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TasksVars {
    #[serde(default)]
    label_id: Option<i32>,
    #[serde(flatten)]
    args: ListArgs,
}

#[derive(Deserialize)]
struct IdVars {
    id: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdVars {
    user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelIdVars {
    label_id: i32,
}

#[derive(Deserialize)]
struct LegacyUpdateVars {
    id: i32,
    #[serde(flatten)]
    update: LegacyTaskUpdate,
}

#[derive(Deserialize)]
struct StatusVars {
    id: i32,
    status: String,
}

#[derive(Deserialize)]
struct DetailsVars {
    id: i32,
    #[serde(flatten)]
    patch: TaskPatch,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetLabelVars {
    task_id: i32,
    #[serde(default)]
    label_id: Option<i32>,
}

/// Executes named operations against a shared store.
#[derive(Clone)]
pub struct Gateway {
    db: Arc<TaskBoardDb>,
    include_error_details: bool,
}

impl Gateway {
    pub fn new(db: Arc<TaskBoardDb>) -> Self {
        Self {
            db,
            include_error_details: false,
        }
    }

    pub fn with_error_details(mut self, include: bool) -> Self {
        self.include_error_details = include;
        self
    }

    pub fn db(&self) -> &TaskBoardDb {
        &self.db
    }

    /// Run one request. Failures never escape; they end up in the envelope.
    pub async fn execute(&self, request: GraphRequest) -> GraphResponse {
        self.execute_with(request, true).await
    }

    /// Run a request received over GET, where mutations are refused.
    pub async fn execute_query(&self, request: GraphRequest) -> GraphResponse {
        self.execute_with(request, false).await
    }

    async fn execute_with(&self, request: GraphRequest, allow_mutations: bool) -> GraphResponse {
        let name = request.operation_name;
        let Some(op) = Operation::from_name(&name) else {
            log::warn!("Unknown operation {name:?}");
            let err = TaskBoardError::validation("request", format!("unknown operation '{name}'"));
            return self.failure(&name, err);
        };
        if op.is_mutation() && !allow_mutations {
            let err = TaskBoardError::validation(op.name(), "mutations must be sent with POST");
            return self.failure(&name, err);
        }

        let variables = match request.variables {
            None | Some(JsonValue::Null) => JsonValue::Object(Map::new()),
            Some(vars) => vars,
        };
        log::debug!("Executing {name}");
        match self.dispatch(op, variables).await {
            Ok(value) => success(&name, value),
            Err(err) => self.failure(&name, err),
        }
    }

    async fn dispatch(&self, op: Operation, vars: JsonValue) -> Result<JsonValue, TaskBoardError> {
        let query = self.db.query();
        let mutation = self.db.mutation();
        match op {
            Operation::Tasks => {
                let v: TasksVars = decode(op, vars)?;
                to_json(query.tasks(v.label_id, &v.args).await?)
            }
            Operation::TaskById => {
                let v: IdVars = decode(op, vars)?;
                to_json(query.task_by_id(v.id).await?)
            }
            Operation::UserPreferences => {
                let args: ListArgs = decode(op, vars)?;
                to_json(query.user_preferences(&args).await?)
            }
            Operation::UserPreferencesByUserId => {
                let v: UserIdVars = decode(op, vars)?;
                to_json(query.user_preferences_by_user_id(&v.user_id).await?)
            }
            Operation::Labels => {
                let args: ListArgs = decode(op, vars)?;
                to_json(query.labels(&args).await?)
            }
            Operation::LabelTasks => {
                let v: LabelIdVars = decode(op, vars)?;
                to_json(query.label_tasks(v.label_id).await?)
            }
            Operation::AddTask => {
                let input: NewTask = decode(op, vars)?;
                to_json(mutation.add_task(input).await?)
            }
            Operation::UpdateTask => {
                let v: LegacyUpdateVars = decode(op, vars)?;
                to_json(mutation.update_task(v.id, v.update).await?)
            }
            Operation::UpdateTaskStatus => {
                let v: StatusVars = decode(op, vars)?;
                to_json(mutation.update_task_status(v.id, &v.status).await?)
            }
            Operation::UpdateTaskDetails => {
                let v: DetailsVars = decode(op, vars)?;
                to_json(mutation.update_task_details(v.id, v.patch).await?)
            }
            Operation::DeleteTask => {
                let v: IdVars = decode(op, vars)?;
                to_json(mutation.delete_task(v.id).await?)
            }
            Operation::AddLabel => {
                let input: NewLabel = decode(op, vars)?;
                to_json(mutation.add_label(input).await?)
            }
            Operation::SetTaskLabel => {
                let v: SetLabelVars = decode(op, vars)?;
                to_json(mutation.set_task_label(v.task_id, v.label_id).await?)
            }
            Operation::AddOrUpdateUserPreferences => {
                let input: PreferencesInput = decode(op, vars)?;
                to_json(mutation.add_or_update_user_preferences(input).await?)
            }
            Operation::ClearAllData => to_json(mutation.clear_all_data().await?),
        }
    }

    /// Reply to a request that could not be read at all: no operation ran,
    /// so `data` is null and the error has an empty path.
    pub fn malformed(&self, message: impl Into<String>) -> GraphResponse {
        let err = TaskBoardError::validation("request", message);
        log::warn!("Rejected request: {err}");
        GraphResponse {
            data: JsonValue::Null,
            errors: vec![GraphError {
                message: err.to_string(),
                path: Vec::new(),
                extensions: ErrorExtensions {
                    code: err.code().to_string(),
                },
            }],
        }
    }

    fn failure(&self, name: &str, err: TaskBoardError) -> GraphResponse {
        let code = err.code();
        let hide = !self.include_error_details
            && matches!(code, "CONSTRAINT_VIOLATION" | "INTERNAL_ERROR");
        let message = if hide {
            log::error!("{name} failed: {err}");
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            log::warn!("{name} failed: {err}");
            err.to_string()
        };

        let mut data = Map::new();
        data.insert(name.to_string(), JsonValue::Null);
        GraphResponse {
            data: JsonValue::Object(data),
            errors: vec![GraphError {
                message,
                path: vec![name.to_string()],
                extensions: ErrorExtensions {
                    code: code.to_string(),
                },
            }],
        }
    }
}

fn success(name: &str, value: JsonValue) -> GraphResponse {
    let mut data = Map::new();
    data.insert(name.to_string(), value);
    GraphResponse {
        data: JsonValue::Object(data),
        errors: Vec::new(),
    }
}

fn decode<T: DeserializeOwned>(op: Operation, vars: JsonValue) -> Result<T, TaskBoardError> {
    serde_json::from_value(vars)
        .map_err(|e| TaskBoardError::validation(op.name(), format!("invalid variables: {e}")))
}

fn to_json<T: Serialize>(value: T) -> Result<JsonValue, TaskBoardError> {
    serde_json::to_value(value)
        .map_err(|e| TaskBoardError::Transport(format!("failed to encode result: {e}")))
}
