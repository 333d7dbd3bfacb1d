//! Normalised client state and the reducers that maintain it.
//!
//! Three independent reducers fold actions into three tables. Each is a pure
//! function `(state, &action) -> state` that returns its input unchanged for
//! intents it does not handle. Entity reducers only apply committed actions
//! (plain intents and `REPLY_RECEIVED`); in-flight and failed requests reach
//! the request-lifecycle reducer only.
//!
//! Identifiers are canonicalised to strings on the way in, whether the
//! payload carried `"25"` or `25`.

pub mod projects;
pub mod requests;
pub mod tasks;

use serde::Serialize;
use serde_json::Value;

use super::action::Action;

pub use projects::{ProjectEntry, ProjectsState};
pub use requests::RequestsState;
pub use tasks::{TaskEntry, TasksState};

/// Everything the view renders from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    /// Projects by pid.
    pub projects: ProjectsState,
    /// Tasks by tid.
    pub tasks: TasksState,
    /// In-flight counter and accumulated failures.
    pub requests: RequestsState,
}

impl AppState {
    /// Runs all three reducers over one action.
    pub fn reduce(self, action: &Action) -> Self {
        Self {
            projects: projects::reduce(self.projects, action),
            tasks: tasks::reduce(self.tasks, action),
            requests: requests::reduce(self.requests, action),
        }
    }

    /// Incomplete tasks of `pid`, counted from the tasks table.
    pub fn incomplete_tasks(&self, pid: &str) -> i64 {
        let count = self
            .tasks
            .values()
            .filter(|task| task.pid == pid && !task.completed)
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }
}

/// Reads an identifier field as a canonical string.
pub(crate) fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

/// Same coercion the server applies to `completed`.
pub(crate) fn bool_field(value: &Value, key: &str) -> Option<bool> {
    match value.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => {
            let s = s.trim();
            Some(!(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")))
        },
        _ => None,
    }
}
