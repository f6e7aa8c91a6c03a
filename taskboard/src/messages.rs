use serde::{Deserialize, Serialize};

/// The kind of write a session performed on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

/// Lightweight event broadcast after a session commits, one per written row.
///
/// `primary_key` is empty for bulk deletes that do not target a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotification {
    pub table: String,
    pub kind: WriteKind,
    pub primary_key: String,
}
