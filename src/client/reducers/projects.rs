//! Projects by id.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::{bool_field, id_field, str_field};
use crate::client::action::{Action, ActionKind};
use crate::types::{DEFAULT_DESCRIPTION, DEFAULT_PROJECT_NAME};

/// A project as the client knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    /// Canonical string id.
    pub pid: String,
    /// Display name.
    pub name: String,
    /// Description; `None` until fetched.
    pub descr: Option<String>,
    /// Task ids in order; `None` until the detail was fetched.
    pub task_ids: Option<Vec<String>>,
    /// Incomplete tasks, maintained incrementally.
    pub pending: i64,
}

impl ProjectEntry {
    fn new(pid: String) -> Self {
        Self {
            pid,
            name: String::new(),
            descr: None,
            task_ids: None,
            pending: 0,
        }
    }
}

/// Projects keyed by pid.
pub type ProjectsState = BTreeMap<String, ProjectEntry>;

/// Folds one action into the projects table.
pub fn reduce(mut state: ProjectsState, action: &Action) -> ProjectsState {
    if !action.is_committed() {
        return state;
    }
    let Some(payload) = action.data() else {
        return state;
    };

    match action.kind {
        ActionKind::AllProjects => {
            for item in payload.as_array().into_iter().flatten() {
                let Some(pid) = id_field(item, "pid") else {
                    continue;
                };
                state.entry(pid.clone()).or_insert_with(|| ProjectEntry {
                    name: str_field(item, "name").unwrap_or_default(),
                    descr: str_field(item, "descr"),
                    pending: item.get("pending").and_then(Value::as_i64).unwrap_or(0),
                    ..ProjectEntry::new(pid)
                });
            }
        },
        ActionKind::ProjectById => {
            if let Some(pid) = id_field(payload, "pid") {
                let mut entry = state
                    .remove(&pid)
                    .unwrap_or_else(|| ProjectEntry::new(pid.clone()));
                if let Some(name) = str_field(payload, "name") {
                    entry.name = name;
                }
                if let Some(descr) = str_field(payload, "descr") {
                    entry.descr = Some(descr);
                }
                if let Some(tasks) = payload.get("tasks").and_then(Value::as_array) {
                    entry.task_ids = Some(tasks.iter().filter_map(|t| id_field(t, "tid")).collect());
                    let open = tasks
                        .iter()
                        .filter(|t| !bool_field(t, "completed").unwrap_or(false))
                        .count();
                    entry.pending = i64::try_from(open).unwrap_or(i64::MAX);
                }
                state.insert(pid, entry);
            }
        },
        ActionKind::AddProject => {
            if let Some(pid) = id_field(payload, "pid") {
                let entry = ProjectEntry {
                    name: str_field(payload, "name")
                        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
                    descr: Some(
                        str_field(payload, "descr")
                            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
                    ),
                    task_ids: Some(Vec::new()),
                    ..ProjectEntry::new(pid.clone())
                };
                state.insert(pid, entry);
            }
        },
        ActionKind::UpdateProject => {
            if let Some(entry) = id_field(payload, "pid").and_then(|pid| state.get_mut(&pid)) {
                if let Some(name) = str_field(payload, "name") {
                    entry.name = name;
                }
                if let Some(descr) = str_field(payload, "descr") {
                    entry.descr = Some(descr);
                }
            }
        },
        ActionKind::DeleteProject => {
            if let Some(pid) = id_field(payload, "pid") {
                state.remove(&pid);
            }
        },
        ActionKind::AddTask => {
            let (Some(pid), Some(tid)) = (id_field(payload, "pid"), id_field(payload, "tid")) else {
                return state;
            };
            if let Some(entry) = state.get_mut(&pid) {
                if let Some(ids) = entry.task_ids.as_mut() {
                    if ids.contains(&tid) {
                        return state;
                    }
                    ids.push(tid);
                }
                if !bool_field(payload, "completed").unwrap_or(false) {
                    entry.pending += 1;
                }
            }
        },
        ActionKind::DeleteTask => {
            let (Some(pid), Some(tid)) = (id_field(payload, "pid"), id_field(payload, "tid")) else {
                return state;
            };
            if let Some(entry) = state.get_mut(&pid) {
                if let Some(ids) = entry.task_ids.as_mut() {
                    let before = ids.len();
                    ids.retain(|id| *id != tid);
                    if ids.len() == before {
                        return state;
                    }
                }
                if !bool_field(payload, "completed").unwrap_or(false) {
                    entry.pending = (entry.pending - 1).max(0);
                }
            }
        },
        ActionKind::TaskCompletedChange => {
            let pid = id_field(payload, "pid");
            let completed = bool_field(payload, "completed");
            if let (Some(entry), Some(completed)) = (pid.and_then(|p| state.get_mut(&p)), completed)
            {
                entry.pending = if completed {
                    (entry.pending - 1).max(0)
                } else {
                    entry.pending + 1
                };
            }
        },
        ActionKind::UpdateTask => {
            let pid = id_field(payload, "pid");
            let change = (
                bool_field(payload, "wasCompleted"),
                bool_field(payload, "completed"),
            );
            if let (Some(entry), (Some(was), Some(now))) =
                (pid.and_then(|p| state.get_mut(&p)), change)
            {
                if was && !now {
                    entry.pending += 1;
                } else if !was && now {
                    entry.pending = (entry.pending - 1).max(0);
                }
            }
        },
        ActionKind::ClearHttpErrors | ActionKind::Other(_) => {},
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::action::settle;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn reply(kind: ActionKind, payload: Value) -> Action {
        settle(kind, Value::Null, Ok(payload))
    }

    fn detail() -> Action {
        reply(
            ActionKind::ProjectById,
            json!({
                "pid": "34",
                "name": "Omelette",
                "descr": "Tortilla",
                "tasks": [
                    {"tid": "4", "descr": "Peel", "completed": true},
                    {"tid": "6", "descr": "Chop", "completed": false},
                ]
            }),
        )
    }

    #[test]
    fn list_never_overwrites_local_entries() {
        let state = reduce(ProjectsState::new(), &detail());
        let state = reduce(
            state,
            &reply(
                ActionKind::AllProjects,
                json!([
                    {"pid": "34", "name": "stale", "pending": 9},
                    {"pid": 25, "name": "Book", "pending": 1},
                ]),
            ),
        );
        assert_eq!(state["34"].name, "Omelette");
        assert_eq!(state["34"].pending, 1);
        assert_eq!(state["25"].name, "Book");
        assert_eq!(state["25"].task_ids, None);
    }

    #[test]
    fn detail_sets_task_ids_and_pending() {
        let state = reduce(ProjectsState::new(), &detail());
        assert_eq!(
            state["34"].task_ids,
            Some(vec!["4".to_string(), "6".to_string()])
        );
        assert_eq!(state["34"].pending, 1);
    }

    #[test]
    fn task_changes_adjust_pending() {
        let state = reduce(ProjectsState::new(), &detail());
        let state = reduce(
            state,
            &reply(ActionKind::AddTask, json!({"pid": "34", "tid": "10", "descr": "Eat"})),
        );
        assert_eq!(state["34"].pending, 2);

        let state = reduce(state, &Action::task_completed_change("34", "10", true));
        assert_eq!(state["34"].pending, 1);

        let state = reduce(
            state,
            &reply(
                ActionKind::DeleteTask,
                json!({"pid": "34", "tid": "6", "completed": false}),
            ),
        );
        assert_eq!(state["34"].pending, 0);
        assert_eq!(
            state["34"].task_ids,
            Some(vec!["4".to_string(), "10".to_string()])
        );
    }

    #[test]
    fn confirmed_update_moves_pending_with_completion() {
        let state = reduce(ProjectsState::new(), &detail());
        let state = reduce(
            state,
            &reply(
                ActionKind::UpdateTask,
                json!({"pid": "34", "tid": "6", "completed": true, "wasCompleted": false}),
            ),
        );
        assert_eq!(state["34"].pending, 0);

        let state = reduce(
            state,
            &reply(
                ActionKind::UpdateTask,
                json!({"pid": "34", "tid": "4", "completed": false, "wasCompleted": true}),
            ),
        );
        assert_eq!(state["34"].pending, 1);

        // No previous value: the optimistic toggle already counted it.
        let state = reduce(
            state,
            &reply(ActionKind::UpdateTask, json!({"pid": "34", "tid": "6", "completed": false})),
        );
        assert_eq!(state["34"].pending, 1);
    }

    #[test]
    fn in_flight_and_failed_actions_are_ignored() {
        let state = reduce(ProjectsState::new(), &detail());
        let failed = settle(
            ActionKind::DeleteProject,
            json!({"pid": "34"}),
            Err(crate::client::transport::RequestError::Status {
                status: 500,
                message: "Internal server error".to_string(),
                url: "/projects/34".to_string(),
            }),
        );
        let after = reduce(state.clone(), &failed);
        assert_eq!(after, state);
    }

    #[test]
    fn delete_removes_project() {
        let state = reduce(ProjectsState::new(), &detail());
        let state = reduce(state, &reply(ActionKind::DeleteProject, json!({"pid": "34"})));
        assert!(state.is_empty());
    }
}
