//! HTTP implementation of [`BoardApi`], talking to the gateway.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use taskboard::board::BoardApi;
use taskboard::{Connection, LabelNode, NewLabel, NewTask, TaskBoardError, TaskNode, TaskPatch};

use crate::gateway::{GraphRequest, GraphResponse};
use crate::routes::GRAPHQL_PATH;

/// Posts named operations to a running gateway.
#[derive(Clone)]
pub struct HttpBoardApi {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpBoardApi {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}{GRAPHQL_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one operation and decode `data.<operation>`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        variables: JsonValue,
    ) -> Result<T, TaskBoardError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&GraphRequest::new(operation, variables))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TaskBoardError::Transport(format!("{operation}: {e}")))?;
        let body: GraphResponse = resp
            .json()
            .await
            .map_err(|e| TaskBoardError::Transport(format!("{operation}: invalid response: {e}")))?;

        if let Some(err) = body.errors.first() {
            return Err(TaskBoardError::Transport(format!(
                "{operation}: {} ({})",
                err.message, err.extensions.code
            )));
        }
        let value = body.data.get(operation).cloned().unwrap_or(JsonValue::Null);
        serde_json::from_value(value)
            .map_err(|e| TaskBoardError::Transport(format!("{operation}: invalid result: {e}")))
    }
}

fn to_variables<T: serde::Serialize>(value: &T) -> Result<JsonValue, TaskBoardError> {
    serde_json::to_value(value)
        .map_err(|e| TaskBoardError::Transport(format!("failed to encode variables: {e}")))
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn tasks(&self) -> Result<Vec<TaskNode>, TaskBoardError> {
        let page: Connection<TaskNode> = self.call("tasks", json!({})).await?;
        Ok(page.nodes)
    }

    async fn labels(&self) -> Result<Vec<LabelNode>, TaskBoardError> {
        let page: Connection<LabelNode> = self.call("labels", json!({})).await?;
        Ok(page.nodes)
    }

    async fn add_task(&self, input: NewTask) -> Result<TaskNode, TaskBoardError> {
        self.call("addTask", to_variables(&input)?).await
    }

    async fn update_task_status(&self, id: i32, status: &str) -> Result<TaskNode, TaskBoardError> {
        self.call("updateTaskStatus", json!({ "id": id, "status": status }))
            .await
    }

    async fn update_task_details(&self, id: i32, patch: TaskPatch) -> Result<TaskNode, TaskBoardError> {
        let mut variables = to_variables(&patch)?;
        if let Some(map) = variables.as_object_mut() {
            map.insert("id".into(), id.into());
        }
        self.call("updateTaskDetails", variables).await
    }

    async fn delete_task(&self, id: i32) -> Result<bool, TaskBoardError> {
        self.call("deleteTask", json!({ "id": id })).await
    }

    async fn add_label(&self, input: NewLabel) -> Result<LabelNode, TaskBoardError> {
        self.call("addLabel", to_variables(&input)?).await
    }
}
