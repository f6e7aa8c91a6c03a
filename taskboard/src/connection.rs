use sea_orm::{
    sea_query::SqliteQueryBuilder, ConnectOptions, ConnectionTrait, Database, DatabaseBackend,
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, Schema, TransactionTrait,
};
use tokio::sync::broadcast;

use crate::entity::{task, task_label, user_preferences};
use crate::listing::PageLimits;
use crate::messages::{ChangeNotification, WriteKind};
use crate::mutation::Mutations;
use crate::query::Queries;

/// Handle to the task store.
///
/// Wraps a SeaORM connection pool. Reads go straight to the pool; every
/// mutation runs inside its own [`Session`]. Committed writes are announced
/// on a broadcast channel as [`ChangeNotification`]s.
pub struct TaskBoardDb {
    inner: DatabaseConnection,
    change_tx: broadcast::Sender<ChangeNotification>,
    page_limits: PageLimits,
}

impl TaskBoardDb {
    /// Get a reference to the underlying SeaORM connection.
    pub fn inner(&self) -> &DatabaseConnection {
        &self.inner
    }

    /// Read-side operations.
    pub fn query(&self) -> Queries<'_> {
        Queries::new(self)
    }

    /// Write-side operations.
    pub fn mutation(&self) -> Mutations<'_> {
        Mutations::new(self)
    }

    pub fn page_limits(&self) -> PageLimits {
        self.page_limits
    }

    /// Subscribe to committed-write notifications.
    pub fn change_rx(&self) -> broadcast::Receiver<ChangeNotification> {
        self.change_tx.subscribe()
    }

    /// Start building the schema.
    ///
    /// Returns a [`SchemaBuilder`] that lets you register entities and then
    /// create all their tables with `.sync().await`.
    pub fn schema(&self) -> SchemaBuilder<'_> {
        SchemaBuilder {
            db: self,
            entries: Vec::new(),
        }
    }

    /// Open a unit of work scoped to one API call.
    ///
    /// The session must be [committed](Session::commit); dropping it rolls
    /// the transaction back.
    pub async fn session(&self) -> Result<Session<'_>, DbErr> {
        let txn = self.inner.begin().await?;
        Ok(Session {
            db: self,
            txn,
            changes: Vec::new(),
        })
    }

    fn notify_change(&self, notification: ChangeNotification) {
        // No receivers is fine.
        let _ = self.change_tx.send(notification);
    }

    fn get_database_backend(&self) -> DatabaseBackend {
        self.inner.get_database_backend()
    }
}

/// One transaction covering a single mutation call.
pub struct Session<'a> {
    db: &'a TaskBoardDb,
    txn: DatabaseTransaction,
    changes: Vec<ChangeNotification>,
}

impl<'a> Session<'a> {
    /// The transaction to run statements on.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Remember a write so it is announced once the session commits.
    pub(crate) fn record(&mut self, table: &str, kind: WriteKind, primary_key: impl ToString) {
        self.changes.push(ChangeNotification {
            table: table.to_string(),
            kind,
            primary_key: primary_key.to_string(),
        });
    }

    /// Commit the transaction, then broadcast the recorded writes.
    pub async fn commit(self) -> Result<(), DbErr> {
        let Session { db, txn, changes } = self;
        txn.commit().await?;
        for change in changes {
            db.notify_change(change);
        }
        Ok(())
    }
}

/// Builder for declaring which entities get tables.
///
/// Created via [`TaskBoardDb::schema()`].
///
/// # Example
///
/// ```ignore
/// db.schema()
///     .register(task_label::Entity)
///     .register(task::Entity)
///     .sync()
///     .await?;
/// ```
pub struct SchemaBuilder<'a> {
    db: &'a TaskBoardDb,
    entries: Vec<EntityEntry>,
}

struct EntityEntry {
    table_name: String,
    create_sql: String,
}

impl<'a> SchemaBuilder<'a> {
    /// Register a SeaORM entity. Tables are created in registration order, so
    /// referenced tables must come first.
    pub fn register<E>(mut self, _entity: E) -> Self
    where
        E: EntityTrait,
    {
        let schema = Schema::new(self.db.get_database_backend());
        let create_sql = schema
            .create_table_from_entity(E::default())
            .if_not_exists()
            .to_owned()
            .to_string(SqliteQueryBuilder);

        self.entries.push(EntityEntry {
            table_name: E::default().table_name().to_string(),
            create_sql,
        });
        self
    }

    /// Create all registered tables that do not exist yet.
    pub async fn sync(self) -> Result<(), DbErr> {
        for entry in self.entries {
            log::debug!("Ensuring table {}", entry.table_name);
            self.db.inner.execute_unprepared(&entry.create_sql).await?;
        }
        Ok(())
    }
}

/// Builder for [`TaskBoardDb`].
pub struct TaskBoardDbBuilder {
    database_url: String,
    max_connections: Option<u32>,
    page_limits: PageLimits,
}

impl TaskBoardDbBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            database_url: url.to_string(),
            max_connections: None,
            page_limits: PageLimits::default(),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Page size used when a list query asks for none, and the hard cap on
    /// what it may ask for.
    pub fn with_page_limits(mut self, default_size: u64, max_size: u64) -> Self {
        self.page_limits = PageLimits::new(default_size, max_size);
        self
    }

    /// Connect and create the `task_labels`, `tasks` and `user_preferences`
    /// tables if missing.
    pub async fn build(self) -> Result<TaskBoardDb, DbErr> {
        let mut opts = ConnectOptions::new(&self.database_url);
        opts.sqlx_logging_level(log::LevelFilter::Debug);
        if let Some(max) = self.max_connections {
            opts.max_connections(max);
        }
        let inner = Database::connect(opts).await?;
        log::info!("Connected to {}", self.database_url);

        let (change_tx, _) = broadcast::channel::<ChangeNotification>(256);

        let db = TaskBoardDb {
            inner,
            change_tx,
            page_limits: self.page_limits,
        };

        db.schema()
            .register(task_label::Entity)
            .register(task::Entity)
            .register(user_preferences::Entity)
            .sync()
            .await?;

        Ok(db)
    }
}
