use sea_orm::entity::prelude::*;

use super::{check_max_len, check_required, written};
use crate::TaskBoardError;

pub const NAME_MAX_LEN: usize = 200;
pub const DEFAULT_COLOR: &str = "#CCCCCC";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "task_labels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn check_constraints(&self, inserting: bool) -> Result<(), TaskBoardError> {
        check_required("task_labels", "name", &self.name, inserting)?;
        if let Some(name) = written(&self.name) {
            check_max_len("task_labels", "name", name, NAME_MAX_LEN)?;
        }
        Ok(())
    }
}
