//! The client state container.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::action::{Action, AsyncAction, Dispatcher};
use super::api::ProjectsApi;
use super::reducers::AppState;
use super::transport::Transport;

/// Holds [`AppState`], applies actions one at a time and publishes every new
/// state to subscribers.
///
/// The `watch` sender owns the state, so reducing and publishing happen
/// under the same lock and subscribers always end on the latest state.
/// Cloning shares the same state.
#[derive(Clone)]
pub struct ClientStore {
    updates: Arc<watch::Sender<AppState>>,
}

impl std::fmt::Debug for ClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStore")
            .field("state", &*self.updates.borrow())
            .finish()
    }
}

impl Default for ClientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientStore {
    /// Empty state.
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// Starts from `state`.
    pub fn with_state(state: AppState) -> Self {
        Self {
            updates: Arc::new(watch::Sender::new(state)),
        }
    }

    /// Applies one action through all reducers.
    pub fn dispatch(&self, action: Action) {
        debug!(kind = %action.kind, stage = ?action.stage(), "dispatch");
        self.updates.send_modify(|state| {
            let next = std::mem::take(state).reduce(&action);
            *state = next;
        });
    }

    /// Starts an async action: `REQUEST_SENT` is applied before this returns,
    /// the reply or failure when the returned future completes.
    pub fn dispatch_async(&self, action: AsyncAction) -> impl Future<Output = Action> + Send + 'static {
        action.start(self.clone())
    }

    /// Current state.
    pub fn state(&self) -> AppState {
        self.updates.borrow().clone()
    }

    /// Receives every state published from now on.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.updates.subscribe()
    }

    /// `CLEAR_HTTP_ERRORS`
    pub fn clear_http_errors(&self) {
        self.dispatch(Action::clear_http_errors());
    }

    /// Sets a task's completion optimistically.
    ///
    /// The local state flips immediately; then `UPDATE_TASK` goes to the
    /// server. If it fails, the inverse toggle is dispatched and the failure
    /// stays in the error list. Returns `None` without any request when the
    /// task is unknown or already in the requested state.
    pub async fn complete_task<T: Transport>(
        &self,
        api: &ProjectsApi<T>,
        pid: &str,
        tid: &str,
        completed: bool,
    ) -> Option<Action> {
        let current = self.updates.borrow().tasks.get(tid).map(|task| task.completed);
        if current != Some(!completed) {
            return None;
        }

        self.dispatch(Action::task_completed_change(pid, tid, completed));
        let outcome = self
            .dispatch_async(api.send_task_update(pid, tid, None, Some(completed), None))
            .await;
        if outcome.is_error() {
            warn!(pid, tid, "completion change rejected, rolling back");
            self.dispatch(Action::task_completed_change(pid, tid, !completed));
        }
        Some(outcome)
    }
}

impl Dispatcher for ClientStore {
    fn dispatch(&self, action: Action) {
        ClientStore::dispatch(self, action);
    }
}
