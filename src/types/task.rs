//! Task records and the shapes they take on the wire.

use serde::{Deserialize, Serialize};

use super::ids::{Pid, Tid};
use super::project::DEFAULT_DESCRIPTION;

/// A task row as stored, returned by `GET /projects/:pid/:tid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Surrogate key.
    pub tid: Tid,
    /// Owning project.
    pub pid: Pid,
    /// What needs doing.
    pub descr: String,
    /// Whether it has been done.
    pub completed: bool,
}

impl TaskRecord {
    /// Drops the back-reference for embedding inside a project detail.
    pub fn into_summary(self) -> TaskSummary {
        TaskSummary {
            tid: self.tid,
            descr: self.descr,
            completed: self.completed,
        }
    }
}

/// A task as listed inside `GET /projects/:pid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Surrogate key.
    pub tid: Tid,
    /// What needs doing.
    pub descr: String,
    /// Whether it has been done.
    pub completed: bool,
}

/// Values for a task insert, defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// What needs doing.
    pub descr: String,
    /// Initial completion state.
    pub completed: bool,
}

/// Validated task mutation: only the fields the client sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New description, if changed.
    pub descr: Option<String>,
    /// New completion state, if changed.
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// True when no mutable field is present.
    pub fn is_empty(&self) -> bool {
        self.descr.is_none() && self.completed.is_none()
    }

    /// Fills absent fields with the insert defaults.
    pub fn into_new(self) -> NewTask {
        NewTask {
            descr: self.descr.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            completed: self.completed.unwrap_or(false),
        }
    }
}
