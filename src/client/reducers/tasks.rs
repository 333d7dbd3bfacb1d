//! Tasks by id.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::{bool_field, id_field, str_field};
use crate::client::action::{Action, ActionKind};
use crate::types::DEFAULT_DESCRIPTION;

/// A task as the client knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEntry {
    /// Canonical string id.
    pub tid: String,
    /// Owning project.
    pub pid: String,
    /// What needs doing.
    pub descr: String,
    /// Whether it has been done.
    pub completed: bool,
}

/// Tasks keyed by tid.
pub type TasksState = BTreeMap<String, TaskEntry>;

/// Folds one action into the tasks table.
///
/// `UPDATE_TASK` and `TASK_COMPLETED_CHANGE` only touch tasks already in the
/// table.
pub fn reduce(mut state: TasksState, action: &Action) -> TasksState {
    if !action.is_committed() {
        return state;
    }
    let Some(payload) = action.data() else {
        return state;
    };

    match action.kind {
        ActionKind::ProjectById => {
            let Some(pid) = id_field(payload, "pid") else {
                return state;
            };
            for task in payload.get("tasks").and_then(Value::as_array).into_iter().flatten() {
                if let Some(tid) = id_field(task, "tid") {
                    state.entry(tid.clone()).or_insert_with(|| TaskEntry {
                        tid,
                        pid: pid.clone(),
                        descr: str_field(task, "descr").unwrap_or_default(),
                        completed: bool_field(task, "completed").unwrap_or(false),
                    });
                }
            }
        },
        ActionKind::AddTask => {
            if let (Some(pid), Some(tid)) = (id_field(payload, "pid"), id_field(payload, "tid")) {
                state.insert(
                    tid.clone(),
                    TaskEntry {
                        tid,
                        pid,
                        descr: str_field(payload, "descr")
                            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
                        completed: bool_field(payload, "completed").unwrap_or(false),
                    },
                );
            }
        },
        ActionKind::UpdateTask | ActionKind::TaskCompletedChange => {
            if let Some(task) = id_field(payload, "tid").and_then(|tid| state.get_mut(&tid)) {
                if let Some(descr) = str_field(payload, "descr") {
                    task.descr = descr;
                }
                if let Some(completed) = bool_field(payload, "completed") {
                    task.completed = completed;
                }
            }
        },
        ActionKind::DeleteTask => {
            if let Some(tid) = id_field(payload, "tid") {
                state.remove(&tid);
            }
        },
        ActionKind::DeleteProject => {
            if let Some(pid) = id_field(payload, "pid") {
                state.retain(|_, task| task.pid != pid);
            }
        },
        ActionKind::AllProjects
        | ActionKind::AddProject
        | ActionKind::UpdateProject
        | ActionKind::ClearHttpErrors
        | ActionKind::Other(_) => {},
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

    fn seeded() -> TasksState {
        reduce(
            TasksState::new(),
            &reply(
                ActionKind::ProjectById,
                json!({
                    "pid": 34,
                    "tasks": [
                        {"tid": 4, "descr": "Peel", "completed": true},
                        {"tid": 6, "descr": "Chop", "completed": false},
                    ]
                }),
            ),
        )
    }

    #[test]
    fn fetch_does_not_overwrite() {
        let mut state = seeded();
        state.get_mut("6").unwrap().descr = "edited".to_string();
        let state = reduce(
            state,
            &reply(
                ActionKind::ProjectById,
                json!({"pid": "34", "tasks": [{"tid": "6", "descr": "Chop", "completed": false}]}),
            ),
        );
        assert_eq!(state["6"].descr, "edited");
        assert_eq!(state["6"].pid, "34");
    }

    #[test]
    fn project_delete_prunes_orphans() {
        let mut state = seeded();
        state.insert(
            "1".to_string(),
            TaskEntry {
                tid: "1".to_string(),
                pid: "25".to_string(),
                descr: "Other".to_string(),
                completed: false,
            },
        );
        let state = reduce(state, &reply(ActionKind::DeleteProject, json!({"pid": "34"})));
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["1"]);
    }

    #[test]
    fn update_merges_fields() {
        let state = reduce(
            seeded(),
            &reply(ActionKind::UpdateTask, json!({"pid": "34", "tid": "6", "completed": true})),
        );
        assert!(state["6"].completed);
        assert_eq!(state["6"].descr, "Chop");

        let state = reduce(
            state,
            &reply(ActionKind::UpdateTask, json!({"pid": "34", "tid": "99", "descr": "x"})),
        );
        assert!(!state.contains_key("99"));
    }

    #[test]
    fn toggle_applies_locally() {
        let state = reduce(seeded(), &Action::task_completed_change("34", "4", false));
        assert!(!state["4"].completed);
    }
}
