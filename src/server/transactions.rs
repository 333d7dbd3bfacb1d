//! Transaction handlers: one [`Operation`] per use case.
//!
//! A handler receives the already validated [`Refined`] request, talks to the
//! store through the [`ProjectStore`] trait and returns the JSON body of a
//! successful reply. Missing rows become [`Error::NotFound`]; store failures
//! are wrapped as [`Error::Storage`] and never shown to the client.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::request::Refined;
use crate::error::{Error, Result};
use crate::store::ProjectStore;
use crate::types::{ProjectDetail, TaskRecord};

/// The use cases behind the REST surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /projects`
    AllProjects,
    /// `GET /projects/:pid`
    ProjectById,
    /// `GET /projects/:pid/:tid`
    TaskById,
    /// `POST /projects`
    AddProject,
    /// `POST /projects/:pid`
    AddTask,
    /// `PUT /projects/:pid`
    UpdateProject,
    /// `PUT /projects/:pid/:tid`
    UpdateTask,
    /// `DELETE /projects/:pid`
    DeleteProject,
    /// `DELETE /projects/:pid/:tid`
    DeleteTask,
}

impl Operation {
    /// Stable name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AllProjects => "all_projects",
            Self::ProjectById => "project_by_id",
            Self::TaskById => "task_by_id",
            Self::AddProject => "add_project",
            Self::AddTask => "add_task",
            Self::UpdateProject => "update_project",
            Self::UpdateTask => "update_task",
            Self::DeleteProject => "delete_project",
            Self::DeleteTask => "delete_task",
        }
    }

    /// Runs the operation against `store`.
    pub async fn execute(self, store: &dyn ProjectStore, refined: Refined) -> Result<Value> {
        debug!(operation = self.name(), keys = ?refined.keys, "executing");
        match self {
            Self::AllProjects => to_json(store.list_projects(&refined.options).await?),
            Self::ProjectById => {
                let pid = refined.pid()?;
                let record = store.get_project(pid).await?.ok_or(Error::NotFound)?;
                let tasks = store
                    .list_tasks(pid)
                    .await?
                    .into_iter()
                    .map(TaskRecord::into_summary)
                    .collect();
                to_json(ProjectDetail::new(record, tasks))
            },
            Self::TaskById => {
                let task = store
                    .get_task(refined.pid()?, refined.tid()?)
                    .await?
                    .ok_or(Error::NotFound)?;
                to_json(task)
            },
            Self::AddProject => {
                let new = refined.project_data()?.clone().into_new();
                let pid = store.create_project(new).await?;
                Ok(json!({ "pid": pid }))
            },
            Self::AddTask => {
                let pid = refined.pid()?;
                if store.get_project(pid).await?.is_none() {
                    return Err(Error::NotFound);
                }
                let tid = store
                    .create_task(pid, refined.task_data()?.clone().into_new())
                    .await?;
                Ok(json!({ "tid": tid }))
            },
            Self::UpdateProject => {
                let pid = store
                    .update_project(refined.pid()?, refined.project_data()?)
                    .await?
                    .ok_or(Error::NotFound)?;
                Ok(json!({ "pid": pid }))
            },
            Self::UpdateTask => {
                let (pid, tid) = store
                    .update_task(refined.pid()?, refined.tid()?, refined.task_data()?)
                    .await?
                    .ok_or(Error::NotFound)?;
                Ok(json!({ "pid": pid, "tid": tid }))
            },
            Self::DeleteProject => {
                let pid = store
                    .delete_project(refined.pid()?)
                    .await?
                    .ok_or(Error::NotFound)?;
                Ok(json!({ "pid": pid }))
            },
            Self::DeleteTask => {
                let (pid, tid) = store
                    .delete_task(refined.pid()?, refined.tid()?)
                    .await?
                    .ok_or(Error::NotFound)?;
                Ok(json!({ "pid": pid, "tid": tid }))
            },
        }
    }
}

fn to_json(value: impl Serialize) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::internal(format!("serialize reply: {e}")))
}
