//! SQLite implementation of [`ProjectStore`].
//!
//! A single [`Connection`] lives behind a `parking_lot::Mutex`; SQLite's own
//! statement semantics serialize writes and the mutex serializes access to
//! the handle. Statements run on `tokio::task::spawn_blocking` so request
//! tasks never block the async workers.
//!
//! # Examples
//!
//! ```
//! use projboard::store::{ProjectStore, SqliteStore};
//! use projboard::types::ProjectPatch;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), projboard::store::StoreError> {
//! let store = SqliteStore::open_in_memory()?;
//! let pid = store
//!     .create_project(ProjectPatch::default().into_new())
//!     .await?;
//! let project = store.get_project(pid).await?.expect("just created");
//! assert_eq!(project.name, "New Project");
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::schema;
use super::{ProjectStore, StoreError, StoreResult};
use crate::types::{
    NewProject, NewTask, Pid, ProjectColumn, ProjectPatch, ProjectQuery, ProjectRecord,
    ProjectSummary, TaskPatch, TaskRecord, Tid,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private in-memory database, gone when the store closes.
    Memory,
    /// Database file on disk.
    File(PathBuf),
}

/// SQLite-backed project store.
///
/// Cloning is cheap and shares the same connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Option<Connection>>>,
    location: StoreLocation,
}

impl SqliteStore {
    /// Opens (creating if needed) a database file and installs the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)?;
        Self::init(conn, StoreLocation::File(path))
    }

    /// Opens a private in-memory database and installs the schema.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, StoreLocation::Memory)
    }

    fn init(conn: Connection, location: StoreLocation) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(schema::PRAGMAS)?;
        conn.execute_batch(schema::SCHEMA)?;
        info!(?location, "project store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            location,
        })
    }

    /// Where this store keeps its data.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Loads the two demo projects when the database has no projects yet.
    ///
    /// Returns `true` when data was inserted.
    pub fn seed_demo_data(&self) -> StoreResult<bool> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(StoreError::Closed)?;
        let existing: i64 = conn.query_row("SELECT COUNT(1) FROM projects", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(false);
        }
        let tx = conn.transaction()?;
        tx.execute_batch(schema::SEED)?;
        tx.commit()?;
        info!("demo projects seeded");
        Ok(true)
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            let conn = guard.as_mut().ok_or(StoreError::Closed)?;
            op(conn)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        tid: Tid::new(row.get(0)?),
        pid: Pid::new(row.get(1)?),
        descr: row.get(2)?,
        completed: row.get::<_, i64>(3)? != 0,
    })
}

fn summary_from_row(row: &Row<'_>, columns: &[ProjectColumn]) -> rusqlite::Result<ProjectSummary> {
    let mut summary = ProjectSummary::default();
    for (idx, column) in columns.iter().enumerate() {
        match column {
            ProjectColumn::Pid => summary.pid = Some(Pid::new(row.get(idx)?)),
            ProjectColumn::Name => summary.name = Some(row.get(idx)?),
            ProjectColumn::Descr => summary.descr = Some(row.get(idx)?),
            ProjectColumn::Pending => summary.pending = Some(row.get(idx)?),
        }
    }
    Ok(summary)
}

/// Builds the listing statement from closed column tokens only.
fn list_sql(query: &ProjectQuery) -> String {
    let columns = query
        .selected()
        .iter()
        .map(|column| column.as_sql())
        .collect::<Vec<_>>()
        .join(", ");
    let filter = match &query.search {
        Some(search) => format!(" WHERE {} LIKE '%' || ?1 || '%'", search.column.as_sql()),
        None => String::new(),
    };
    format!("SELECT {columns} FROM projects_with_pending{filter} ORDER BY pid")
}

/// Builds `SET a = ?, b = ?` from the fields present in a patch.
///
/// The column names come from this function's literals, never from the
/// request.
fn assignments(fields: &[(&'static str, Option<SqlValue>)]) -> (String, Vec<SqlValue>) {
    let mut sets = Vec::new();
    let mut values = Vec::new();
    for (column, value) in fields {
        if let Some(value) = value {
            sets.push(format!("{column} = ?"));
            values.push(value.clone());
        }
    }
    (sets.join(", "), values)
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<Vec<ProjectSummary>> {
        let query = query.clone();
        self.run(move |conn| {
            let sql = list_sql(&query);
            debug!(%sql, "listing projects");
            let columns = query.selected().to_vec();
            let mut stmt = conn.prepare(&sql)?;
            let rows = match &query.search {
                Some(search) => stmt
                    .query_map(params![search.needle], |row| summary_from_row(row, &columns))?
                    .collect::<rusqlite::Result<Vec<_>>>()?,
                None => stmt
                    .query_map([], |row| summary_from_row(row, &columns))?
                    .collect::<rusqlite::Result<Vec<_>>>()?,
            };
            Ok(rows)
        })
        .await
    }

    async fn get_project(&self, pid: Pid) -> StoreResult<Option<ProjectRecord>> {
        self.run(move |conn| {
            let record = conn
                .query_row(
                    "SELECT pid, name, descr FROM projects WHERE pid = ?1",
                    params![pid.get()],
                    |row| {
                        Ok(ProjectRecord {
                            pid: Pid::new(row.get(0)?),
                            name: row.get(1)?,
                            descr: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn list_tasks(&self, pid: Pid) -> StoreResult<Vec<TaskRecord>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT tid, pid, descr, completed FROM tasks WHERE pid = ?1 ORDER BY tid",
            )?;
            let tasks = stmt
                .query_map(params![pid.get()], task_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
        .await
    }

    async fn get_task(&self, pid: Pid, tid: Tid) -> StoreResult<Option<TaskRecord>> {
        self.run(move |conn| {
            let task = conn
                .query_row(
                    "SELECT tid, pid, descr, completed FROM tasks WHERE tid = ?1 AND pid = ?2",
                    params![tid.get(), pid.get()],
                    task_from_row,
                )
                .optional()?;
            Ok(task)
        })
        .await
    }

    async fn create_project(&self, project: NewProject) -> StoreResult<Pid> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO projects (name, descr) VALUES (?1, ?2)",
                params![project.name, project.descr],
            )?;
            Ok(Pid::new(conn.last_insert_rowid()))
        })
        .await
    }

    async fn create_task(&self, pid: Pid, task: NewTask) -> StoreResult<Tid> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO tasks (pid, descr, completed) VALUES (?1, ?2, ?3)",
                params![pid.get(), task.descr, task.completed],
            )?;
            Ok(Tid::new(conn.last_insert_rowid()))
        })
        .await
    }

    async fn update_project(&self, pid: Pid, patch: &ProjectPatch) -> StoreResult<Option<Pid>> {
        let (sets, mut values) = assignments(&[
            ("name", patch.name.clone().map(SqlValue::Text)),
            ("descr", patch.descr.clone().map(SqlValue::Text)),
        ]);
        self.run(move |conn| {
            let changed = if sets.is_empty() {
                conn.query_row(
                    "SELECT COUNT(1) FROM projects WHERE pid = ?1",
                    params![pid.get()],
                    |row| row.get::<_, usize>(0),
                )?
            } else {
                values.push(SqlValue::Integer(pid.get()));
                let sql = format!("UPDATE projects SET {sets} WHERE pid = ?");
                conn.execute(&sql, params_from_iter(values))?
            };
            Ok((changed > 0).then_some(pid))
        })
        .await
    }

    async fn update_task(
        &self,
        pid: Pid,
        tid: Tid,
        patch: &TaskPatch,
    ) -> StoreResult<Option<(Pid, Tid)>> {
        let (sets, mut values) = assignments(&[
            ("descr", patch.descr.clone().map(SqlValue::Text)),
            (
                "completed",
                patch.completed.map(|done| SqlValue::Integer(i64::from(done))),
            ),
        ]);
        self.run(move |conn| {
            let changed = if sets.is_empty() {
                conn.query_row(
                    "SELECT COUNT(1) FROM tasks WHERE pid = ?1 AND tid = ?2",
                    params![pid.get(), tid.get()],
                    |row| row.get::<_, usize>(0),
                )?
            } else {
                values.push(SqlValue::Integer(pid.get()));
                values.push(SqlValue::Integer(tid.get()));
                let sql = format!("UPDATE tasks SET {sets} WHERE pid = ? AND tid = ?");
                conn.execute(&sql, params_from_iter(values))?
            };
            Ok((changed > 0).then_some((pid, tid)))
        })
        .await
    }

    async fn delete_project(&self, pid: Pid) -> StoreResult<Option<Pid>> {
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let tasks = tx.execute("DELETE FROM tasks WHERE pid = ?1", params![pid.get()])?;
            let projects = tx.execute("DELETE FROM projects WHERE pid = ?1", params![pid.get()])?;
            tx.commit()?;
            debug!(pid = %pid, tasks, projects, "project deleted");
            Ok((projects > 0).then_some(pid))
        })
        .await
    }

    async fn delete_task(&self, pid: Pid, tid: Tid) -> StoreResult<Option<(Pid, Tid)>> {
        self.run(move |conn| {
            let changed = conn.execute(
                "DELETE FROM tasks WHERE pid = ?1 AND tid = ?2",
                params![pid.get(), tid.get()],
            )?;
            Ok((changed > 0).then_some((pid, tid)))
        })
        .await
    }

    async fn close(&self) -> StoreResult<()> {
        let conn = Arc::clone(&self.conn);
        let taken = tokio::task::spawn_blocking(move || conn.lock().take())
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?;
        match taken {
            Some(conn) => {
                conn.close().map_err(|(_, err)| StoreError::Sql(err))?;
                info!(location = ?self.location, "project store closed");
                Ok(())
            },
            None => Err(StoreError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Search;

    #[test]
    fn list_sql_uses_only_closed_tokens() {
        let query = ProjectQuery {
            columns: Some(vec![ProjectColumn::Name, ProjectColumn::Pending]),
            search: Some(Search {
                column: ProjectColumn::Descr,
                needle: "omelette".to_string(),
            }),
        };
        assert_eq!(
            list_sql(&query),
            "SELECT name, pending FROM projects_with_pending WHERE descr LIKE '%' || ?1 || '%' ORDER BY pid"
        );
        assert_eq!(
            list_sql(&ProjectQuery::default()),
            "SELECT pid, name, descr, pending FROM projects_with_pending ORDER BY pid"
        );
    }

    #[test]
    fn assignments_skip_absent_fields() {
        let (sets, values) = assignments(&[
            ("descr", None),
            ("completed", Some(SqlValue::Integer(1))),
        ]);
        assert_eq!(sets, "completed = ?");
        assert_eq!(values, vec![SqlValue::Integer(1)]);
    }

    #[test]
    fn seed_only_fills_an_empty_database() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.seed_demo_data().unwrap());
        assert!(!store.seed_demo_data().unwrap());
        assert_eq!(store.location(), &StoreLocation::Memory);
    }
}
