//! Read-only queries.
//!
//! Each call is an independent snapshot read on the connection pool; nothing
//! spans calls.

use sea_orm::{
    ColumnTrait, EntityTrait, ModelTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::connection::TaskBoardDb;
use crate::entity::{task, task_label, user_preferences};
use crate::listing::{self, Connection, DerivedFlag, ListArgs};
use crate::views::{LabelNode, TaskNode, UserPreferencesNode};
use crate::{TaskBoardError, TaskStatus};

/// `isCompleted` is not stored; it reads as `status = 'DONE'`.
const IS_COMPLETED: DerivedFlag<task::Column> = DerivedFlag {
    name: "is_completed",
    column: task::Column::Status,
    when_true: TaskStatus::Done.as_str(),
};

pub struct Queries<'a> {
    db: &'a TaskBoardDb,
}

impl<'a> Queries<'a> {
    pub(crate) fn new(db: &'a TaskBoardDb) -> Self {
        Self { db }
    }

    /// Tasks with their labels, newest first unless `args` says otherwise.
    /// `label_id` restricts the result to one label.
    pub async fn tasks(
        &self,
        label_id: Option<i32>,
        args: &ListArgs,
    ) -> Result<Connection<TaskNode>, TaskBoardError> {
        const OP: &str = "tasks";
        let conn = self.db.inner();
        let window = self.db.page_limits().window(args, OP)?;

        let mut select = task::Entity::find();
        if let Some(label_id) = label_id {
            select = select.filter(task::Column::LabelId.eq(label_id));
        }
        let select = listing::apply_filters(select, &args.filter, &[IS_COMPLETED], OP)?;
        let total_count = select.clone().count(conn).await?;
        let select = listing::apply_order(
            select,
            &args.order,
            &[(task::Column::CreatedAt, Order::Desc)],
            &[IS_COMPLETED],
            OP,
        )?;

        let rows = select
            .find_also_related(task_label::Entity)
            .offset(window.offset)
            .limit(window.limit + 1)
            .all(conn)
            .await?;
        let nodes = rows
            .into_iter()
            .map(|(task, label)| TaskNode::from_models(task, label))
            .collect();

        Ok(listing::connection(nodes, window, total_count))
    }

    /// A single task, or `None` if no task has this id.
    pub async fn task_by_id(&self, id: i32) -> Result<Option<TaskNode>, TaskBoardError> {
        let row = task::Entity::find_by_id(id)
            .find_also_related(task_label::Entity)
            .one(self.db.inner())
            .await?;
        Ok(row.map(|(task, label)| TaskNode::from_models(task, label)))
    }

    /// All stored preferences, ordered by user id unless `args` says otherwise.
    pub async fn user_preferences(
        &self,
        args: &ListArgs,
    ) -> Result<Connection<UserPreferencesNode>, TaskBoardError> {
        const OP: &str = "userPreferences";
        let conn = self.db.inner();
        let window = self.db.page_limits().window(args, OP)?;

        let select = listing::apply_filters(user_preferences::Entity::find(), &args.filter, &[], OP)?;
        let total_count = select.clone().count(conn).await?;
        let rows = listing::apply_order(
            select,
            &args.order,
            &[(user_preferences::Column::UserId, Order::Asc)],
            &[],
            OP,
        )?
        .offset(window.offset)
        .limit(window.limit + 1)
        .all(conn)
        .await?;

        let nodes = rows.into_iter().map(UserPreferencesNode::from).collect();
        Ok(listing::connection(nodes, window, total_count))
    }

    /// The first preferences row stored for `user_id`.
    pub async fn user_preferences_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferencesNode>, TaskBoardError> {
        let row = user_preferences::Entity::find()
            .filter(user_preferences::Column::UserId.eq(user_id))
            .order_by_asc(user_preferences::Column::Id)
            .one(self.db.inner())
            .await?;
        Ok(row.map(UserPreferencesNode::from))
    }

    /// All labels, ordered by name unless `args` says otherwise.
    pub async fn labels(&self, args: &ListArgs) -> Result<Connection<LabelNode>, TaskBoardError> {
        const OP: &str = "labels";
        let conn = self.db.inner();
        let window = self.db.page_limits().window(args, OP)?;

        let select = listing::apply_filters(task_label::Entity::find(), &args.filter, &[], OP)?;
        let total_count = select.clone().count(conn).await?;
        let rows = listing::apply_order(
            select,
            &args.order,
            &[(task_label::Column::Name, Order::Asc)],
            &[],
            OP,
        )?
        .offset(window.offset)
        .limit(window.limit + 1)
        .all(conn)
        .await?;

        let nodes = rows.into_iter().map(LabelNode::from).collect();
        Ok(listing::connection(nodes, window, total_count))
    }

    /// Tasks assigned to a label, newest first. `None` if the label is absent.
    pub async fn label_tasks(&self, label_id: i32) -> Result<Option<Vec<TaskNode>>, TaskBoardError> {
        let conn = self.db.inner();
        let Some(label) = task_label::Entity::find_by_id(label_id).one(conn).await? else {
            return Ok(None);
        };
        let tasks = label
            .find_related(task::Entity)
            .order_by_desc(task::Column::CreatedAt)
            .order_by_asc(task::Column::Id)
            .all(conn)
            .await?;
        Ok(Some(
            tasks
                .into_iter()
                .map(|task| TaskNode::from_models(task, Some(label.clone())))
                .collect(),
        ))
    }
}
