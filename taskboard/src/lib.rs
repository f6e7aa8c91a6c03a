//! # taskboard
//!
//! Task, label and user-preference storage for a Kanban-style task manager,
//! built on SeaORM.
//!
//! [`TaskBoardDb`] wraps a SeaORM [`DatabaseConnection`](sea_orm::DatabaseConnection),
//! creates the schema on startup and exposes the API as two groups of
//! operations: [`query`](TaskBoardDb::query) for reads and
//! [`mutation`](TaskBoardDb::mutation) for writes. Every mutation runs in its
//! own [`Session`] and announces committed rows as [`ChangeNotification`]s.
//!
//! ## Quick start
//!
//! ```ignore
//! use taskboard::{NewTask, TaskBoardDbBuilder};
//!
//! let db = TaskBoardDbBuilder::new("sqlite:./tasks.db?mode=rwc")
//!     .build()
//!     .await?;
//!
//! let task = db
//!     .mutation()
//!     .add_task(NewTask {
//!         title: "Write docs".into(),
//!         description: String::new(),
//!         status: None,
//!         label_id: None,
//!     })
//!     .await?;
//!
//! db.mutation().update_task_status(task.id, "IN_PROGRESS").await?;
//! ```
//!
//! ## Key types
//!
//! - [`TaskBoardDb`]: connection wrapper and entry point for every operation
//! - [`TaskBoardDbBuilder`]: configures the pool and page limits, creates tables
//! - [`ListArgs`] / [`Connection`]: filtering, sorting and paging for list queries
//! - [`board::Board`]: client-side Kanban state driven through [`board::BoardApi`]

pub mod board;
pub mod connection;
pub mod entity;
pub mod error;
pub mod listing;
pub mod messages;
pub mod mutation;
pub mod query;
pub mod status;
pub mod views;

pub use connection::{SchemaBuilder, Session, TaskBoardDb, TaskBoardDbBuilder};
pub use error::TaskBoardError;
pub use listing::{
    Connection, FieldFilter, FilterOp, ListArgs, PageInfo, PageLimits, SortDirection, SortField,
};
pub use messages::{ChangeNotification, WriteKind};
pub use mutation::{LegacyTaskUpdate, NewLabel, NewTask, PreferencesInput, TaskPatch};
pub use status::TaskStatus;
pub use views::{LabelNode, TaskNode, UserPreferencesNode};

// Re-export sea-orm for users of the library
pub use sea_orm;
