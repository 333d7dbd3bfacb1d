//! Request lifecycle: how many calls are in flight, and what failed.

use serde::Serialize;

use crate::client::action::{Action, ActionKind, AsyncStage, HttpFailure};

/// In-flight counter and failure list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestsState {
    /// Requests sent and not yet answered.
    pub pending: usize,
    /// Failures in arrival order. Only `CLEAR_HTTP_ERRORS` empties it.
    pub errors: Vec<HttpFailure>,
}

/// Folds one action into the lifecycle counters.
pub fn reduce(mut state: RequestsState, action: &Action) -> RequestsState {
    match action.stage() {
        Some(AsyncStage::RequestSent) => state.pending += 1,
        Some(AsyncStage::ReplyReceived) => state.pending = state.pending.saturating_sub(1),
        Some(AsyncStage::FailureReceived) => {
            state.pending = state.pending.saturating_sub(1);
            if let Some(failure) = action.failure() {
                state.errors.push(failure.clone());
            }
        },
        None => {
            if action.kind == ActionKind::ClearHttpErrors {
                state.errors.clear();
            }
        },
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::action::settle;
    use crate::client::transport::RequestError;
    use serde_json::{json, Value};

    fn failed() -> Action {
        settle(
            ActionKind::AddTask,
            json!({"pid": "1"}),
            Err(RequestError::Unreachable {
                message: "connection refused".to_string(),
                url: "http://localhost/data/projects/1".to_string(),
            }),
        )
    }

    #[test]
    fn counter_floors_at_zero() {
        let state = reduce(
            RequestsState::default(),
            &settle(ActionKind::AllProjects, Value::Null, Ok(json!([]))),
        );
        assert_eq!(state.pending, 0);
    }

    #[test]
    fn failures_accumulate_until_cleared() {
        let state = reduce(RequestsState::default(), &failed());
        let state = reduce(state, &failed());
        assert_eq!(state.errors.len(), 2);
        assert_eq!(state.errors[0].status, None);
        assert_eq!(state.errors[0].action_type, "tasks/ADD_TASK");

        let state = reduce(state, &Action::task_completed_change("1", "2", true));
        assert_eq!(state.errors.len(), 2);

        let state = reduce(state, &Action::clear_http_errors());
        assert!(state.errors.is_empty());
    }
}
