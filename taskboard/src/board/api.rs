use async_trait::async_trait;

use crate::connection::TaskBoardDb;
use crate::listing::ListArgs;
use crate::mutation::{NewLabel, NewTask, TaskPatch};
use crate::views::{LabelNode, TaskNode};
use crate::TaskBoardError;

/// The operations the board issues.
///
/// Implemented in-process by [`TaskBoardDb`] and over HTTP by the server
/// crate's client. Calls are independent: nothing is batched, sequenced or
/// cancelled.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// The first page of tasks, in the server's default order.
    async fn tasks(&self) -> Result<Vec<TaskNode>, TaskBoardError>;

    /// The first page of labels, in the server's default order.
    async fn labels(&self) -> Result<Vec<LabelNode>, TaskBoardError>;

    async fn add_task(&self, input: NewTask) -> Result<TaskNode, TaskBoardError>;

    async fn update_task_status(&self, id: i32, status: &str) -> Result<TaskNode, TaskBoardError>;

    async fn update_task_details(&self, id: i32, patch: TaskPatch) -> Result<TaskNode, TaskBoardError>;

    async fn delete_task(&self, id: i32) -> Result<bool, TaskBoardError>;

    async fn add_label(&self, input: NewLabel) -> Result<LabelNode, TaskBoardError>;
}

#[async_trait]
impl BoardApi for TaskBoardDb {
    async fn tasks(&self) -> Result<Vec<TaskNode>, TaskBoardError> {
        Ok(self.query().tasks(None, &ListArgs::default()).await?.nodes)
    }

    async fn labels(&self) -> Result<Vec<LabelNode>, TaskBoardError> {
        Ok(self.query().labels(&ListArgs::default()).await?.nodes)
    }

    async fn add_task(&self, input: NewTask) -> Result<TaskNode, TaskBoardError> {
        self.mutation().add_task(input).await
    }

    async fn update_task_status(&self, id: i32, status: &str) -> Result<TaskNode, TaskBoardError> {
        self.mutation().update_task_status(id, status).await
    }

    async fn update_task_details(&self, id: i32, patch: TaskPatch) -> Result<TaskNode, TaskBoardError> {
        self.mutation().update_task_details(id, patch).await
    }

    async fn delete_task(&self, id: i32) -> Result<bool, TaskBoardError> {
        self.mutation().delete_task(id).await
    }

    async fn add_label(&self, input: NewLabel) -> Result<LabelNode, TaskBoardError> {
        self.mutation().add_label(input).await
    }
}

#[async_trait]
impl<T> BoardApi for &T
where
    T: BoardApi + ?Sized,
{
    async fn tasks(&self) -> Result<Vec<TaskNode>, TaskBoardError> {
        (**self).tasks().await
    }

    async fn labels(&self) -> Result<Vec<LabelNode>, TaskBoardError> {
        (**self).labels().await
    }

    async fn add_task(&self, input: NewTask) -> Result<TaskNode, TaskBoardError> {
        (**self).add_task(input).await
    }

    async fn update_task_status(&self, id: i32, status: &str) -> Result<TaskNode, TaskBoardError> {
        (**self).update_task_status(id, status).await
    }

    async fn update_task_details(&self, id: i32, patch: TaskPatch) -> Result<TaskNode, TaskBoardError> {
        (**self).update_task_details(id, patch).await
    }

    async fn delete_task(&self, id: i32) -> Result<bool, TaskBoardError> {
        (**self).delete_task(id).await
    }

    async fn add_label(&self, input: NewLabel) -> Result<LabelNode, TaskBoardError> {
        (**self).add_label(input).await
    }
}
