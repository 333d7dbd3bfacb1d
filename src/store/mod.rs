//! Store engine: persistence for projects and tasks.
//!
//! # Architecture
//!
//! 1. **[`ProjectStore`]** -- object-safe async interface used as
//!    `Arc<dyn ProjectStore>` by the request router. Handlers only ever talk
//!    to this trait.
//! 2. **[`SqliteStore`]** -- the embedded implementation. One SQLite
//!    connection, serialized behind a mutex, with every statement executed on
//!    the blocking pool.
//!
//! # Not-found versus failure
//!
//! Reads return `Option` and writes that target an existing row return
//! `Option` too: `Ok(None)` means "no row matched" and lets the handler
//! answer 404, while `Err(_)` is reserved for the store itself failing
//! (answered with 500).
//!
//! # Lifecycle
//!
//! Opening a store installs the schema (`init`). The process entry point owns
//! the store and calls [`ProjectStore::close`] on shutdown; any later call
//! fails with [`StoreError::Closed`].

mod schema;
pub mod sqlite;

use async_trait::async_trait;

use crate::types::{
    NewProject, NewTask, Pid, ProjectPatch, ProjectQuery, ProjectRecord, ProjectSummary, TaskPatch,
    TaskRecord, Tid,
};

pub use sqlite::SqliteStore;

/// Errors raised by the store engine itself.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite rejected a statement or the connection failed.
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Creating the database directory failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker running a statement panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(String),

    /// The store was used after [`ProjectStore::close`].
    #[error("store is closed")]
    Closed,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for projects and their tasks.
///
/// Implementations must be safe to share across request tasks. Every write
/// reports whether it touched a row: zero rows changed is `Ok(None)`, never a
/// silent success.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Lists projects from the pending-count view, honouring the projection
    /// and the single-column search in `query`.
    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<Vec<ProjectSummary>>;

    /// Fetches one project row.
    async fn get_project(&self, pid: Pid) -> StoreResult<Option<ProjectRecord>>;

    /// Lists the tasks of a project in insertion order.
    async fn list_tasks(&self, pid: Pid) -> StoreResult<Vec<TaskRecord>>;

    /// Fetches a task, but only through the project that owns it.
    async fn get_task(&self, pid: Pid, tid: Tid) -> StoreResult<Option<TaskRecord>>;

    /// Inserts a project and returns its new key.
    async fn create_project(&self, project: NewProject) -> StoreResult<Pid>;

    /// Inserts a task under `pid` and returns its new key.
    ///
    /// The caller checks that the project exists; a dangling `pid` is a
    /// storage failure here.
    async fn create_task(&self, pid: Pid, task: NewTask) -> StoreResult<Tid>;

    /// Applies `patch` to a project. `None` when no row changed.
    async fn update_project(&self, pid: Pid, patch: &ProjectPatch) -> StoreResult<Option<Pid>>;

    /// Applies `patch` to a task of `pid`. `None` when no row changed.
    async fn update_task(
        &self,
        pid: Pid,
        tid: Tid,
        patch: &TaskPatch,
    ) -> StoreResult<Option<(Pid, Tid)>>;

    /// Deletes a project together with all of its tasks as one unit.
    /// `None` when the project row did not exist.
    async fn delete_project(&self, pid: Pid) -> StoreResult<Option<Pid>>;

    /// Deletes one task of `pid`. `None` when no row matched.
    async fn delete_task(&self, pid: Pid, tid: Tid) -> StoreResult<Option<(Pid, Tid)>>;

    /// Releases the underlying resources.
    async fn close(&self) -> StoreResult<()>;
}
