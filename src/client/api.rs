//! Async actions for every network-backed intent.

use std::sync::Arc;

use ::http::Method;
use serde_json::{json, Map, Value};

use super::action::{async_action_creator, ActionKind, AsyncAction};
use super::transport::Transport;

/// A change of a task's completion as the client requests it.
///
/// `was` is the value the client held before the change, so reducers can
/// keep the project's pending count in step once the server confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionChange {
    /// Completion before the update.
    pub was: bool,
    /// Completion requested.
    pub now: bool,
}

impl CompletionChange {
    /// Flips from `!now` to `now`.
    pub fn to(now: bool) -> Self {
        Self { was: !now, now }
    }
}

/// Builds [`AsyncAction`]s against one transport.
///
/// Payloads carry only the fields that were given, plus the ids reducers
/// need to place the result.
#[derive(Debug)]
pub struct ProjectsApi<T> {
    transport: Arc<T>,
}

impl<T> Clone for ProjectsApi<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> ProjectsApi<T> {
    /// Wraps a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn call(
        &self,
        kind: ActionKind,
        method: Method,
        path: String,
        body: Option<Value>,
        payload: Value,
    ) -> AsyncAction {
        let transport = Arc::clone(&self.transport);
        async_action_creator(
            kind,
            async move { transport.request(method, &path, body).await },
            payload,
        )
    }

    /// `GET /projects`
    pub fn all_projects(&self) -> AsyncAction {
        self.call(
            ActionKind::AllProjects,
            Method::GET,
            "/projects".to_string(),
            None,
            Value::Null,
        )
    }

    /// `GET /projects/:pid`
    pub fn project_by_id(&self, pid: &str) -> AsyncAction {
        self.call(
            ActionKind::ProjectById,
            Method::GET,
            format!("/projects/{pid}"),
            None,
            json!({ "pid": pid }),
        )
    }

    /// `POST /projects`
    pub fn add_project(&self, name: Option<&str>, descr: Option<&str>) -> AsyncAction {
        let body = fields(&[("name", name.map(Value::from)), ("descr", descr.map(Value::from))]);
        self.call(
            ActionKind::AddProject,
            Method::POST,
            "/projects".to_string(),
            Some(Value::Object(body.clone())),
            Value::Object(body),
        )
    }

    /// `PUT /projects/:pid`
    pub fn update_project(&self, pid: &str, name: Option<&str>, descr: Option<&str>) -> AsyncAction {
        let body = fields(&[("name", name.map(Value::from)), ("descr", descr.map(Value::from))]);
        self.call(
            ActionKind::UpdateProject,
            Method::PUT,
            format!("/projects/{pid}"),
            Some(Value::Object(body.clone())),
            with_ids(body, pid, None),
        )
    }

    /// `DELETE /projects/:pid`
    pub fn delete_project(&self, pid: &str) -> AsyncAction {
        self.call(
            ActionKind::DeleteProject,
            Method::DELETE,
            format!("/projects/{pid}"),
            None,
            json!({ "pid": pid }),
        )
    }

    /// `POST /projects/:pid`
    pub fn add_task(&self, pid: &str, descr: Option<&str>, completed: Option<bool>) -> AsyncAction {
        let body = fields(&[
            ("descr", descr.map(Value::from)),
            ("completed", completed.map(Value::from)),
        ]);
        self.call(
            ActionKind::AddTask,
            Method::POST,
            format!("/projects/{pid}"),
            Some(Value::Object(body.clone())),
            with_ids(body, pid, None),
        )
    }

    /// `PUT /projects/:pid/:tid`
    ///
    /// A completion change carries the previous value in the payload as
    /// `wasCompleted`; the projects reducer adjusts `pending` from it.
    pub fn update_task(
        &self,
        pid: &str,
        tid: &str,
        descr: Option<&str>,
        completed: Option<CompletionChange>,
    ) -> AsyncAction {
        self.send_task_update(
            pid,
            tid,
            descr,
            completed.map(|change| change.now),
            completed.map(|change| change.was),
        )
    }

    /// `UPDATE_TASK` without `wasCompleted` leaves `pending` alone; the
    /// optimistic toggle has already moved it.
    pub(crate) fn send_task_update(
        &self,
        pid: &str,
        tid: &str,
        descr: Option<&str>,
        completed: Option<bool>,
        was_completed: Option<bool>,
    ) -> AsyncAction {
        let body = fields(&[
            ("descr", descr.map(Value::from)),
            ("completed", completed.map(Value::from)),
        ]);
        let mut payload = with_ids(body.clone(), pid, Some(tid));
        if let (Some(was), Value::Object(map)) = (was_completed, &mut payload) {
            map.insert("wasCompleted".to_string(), Value::from(was));
        }
        self.call(
            ActionKind::UpdateTask,
            Method::PUT,
            format!("/projects/{pid}/{tid}"),
            Some(Value::Object(body)),
            payload,
        )
    }

    /// `DELETE /projects/:pid/:tid`
    ///
    /// `completed` travels in the payload so the projects reducer knows
    /// whether the pending count drops.
    pub fn delete_task(&self, pid: &str, tid: &str, completed: bool) -> AsyncAction {
        self.call(
            ActionKind::DeleteTask,
            Method::DELETE,
            format!("/projects/{pid}/{tid}"),
            None,
            json!({ "pid": pid, "tid": tid, "completed": completed }),
        )
    }
}

fn fields(pairs: &[(&str, Option<Value>)]) -> Map<String, Value> {
    pairs
        .iter()
        .filter_map(|(key, value)| value.clone().map(|v| ((*key).to_string(), v)))
        .collect()
}

fn with_ids(mut body: Map<String, Value>, pid: &str, tid: Option<&str>) -> Value {
    body.insert("pid".to_string(), Value::from(pid));
    if let Some(tid) = tid {
        body.insert("tid".to_string(), Value::from(tid));
    }
    Value::Object(body)
}
