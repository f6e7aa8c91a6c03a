use sea_orm::entity::prelude::*;

use super::{check_max_len, check_required, written};
use crate::TaskBoardError;

pub const USER_ID_MAX_LEN: usize = 50;
pub const THEME_MAX_LEN: usize = 20;
pub const LANGUAGE_MAX_LEN: usize = 10;

pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_EMAIL_NOTIFICATIONS: bool = true;

/// Per-user settings. `user_id` is the natural key but carries no unique
/// index, so two concurrent first-time upserts can both insert.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_preferences")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub theme: String,
    pub language: String,
    pub email_notifications: bool,
    pub last_updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn check_constraints(&self, inserting: bool) -> Result<(), TaskBoardError> {
        check_required("user_preferences", "user_id", &self.user_id, inserting)?;
        if let Some(user_id) = written(&self.user_id) {
            check_max_len("user_preferences", "user_id", user_id, USER_ID_MAX_LEN)?;
        }
        if let Some(theme) = written(&self.theme) {
            check_max_len("user_preferences", "theme", theme, THEME_MAX_LEN)?;
        }
        if let Some(language) = written(&self.language) {
            check_max_len("user_preferences", "language", language, LANGUAGE_MAX_LEN)?;
        }
        Ok(())
    }
}
