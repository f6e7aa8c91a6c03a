use sea_orm::entity::prelude::*;

use super::{check_max_len, check_required, written};
use crate::TaskBoardError;

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Canonical [`TaskStatus`](crate::TaskStatus) name.
    pub status: String,
    pub created_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
    pub last_modified: Option<DateTimeUtc>,
    pub label_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::task_label::Entity",
        from = "Column::LabelId",
        to = "super::task_label::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Label,
}

impl Related<super::task_label::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Label.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn check_constraints(&self, inserting: bool) -> Result<(), TaskBoardError> {
        check_required("tasks", "title", &self.title, inserting)?;
        check_required("tasks", "status", &self.status, inserting)?;
        if let Some(title) = written(&self.title) {
            check_max_len("tasks", "title", title, TITLE_MAX_LEN)?;
        }
        if let Some(description) = written(&self.description) {
            check_max_len("tasks", "description", description, DESCRIPTION_MAX_LEN)?;
        }
        Ok(())
    }
}
