//! Intents and the async action creator.
//!
//! An [`Action`] is the only thing reducers see. Plain intents (clearing
//! errors, toggling a task locally) carry no [`Meta`]. Network-backed
//! intents go through [`async_action_creator`], which emits the same intent
//! up to three times with a lifecycle stage in `meta.async_action`:
//!
//! 1. [`AsyncStage::RequestSent`], synchronously, before any I/O;
//! 2. [`AsyncStage::ReplyReceived`] with the request payload merged with the
//!    server response, or
//! 3. [`AsyncStage::FailureReceived`] with an [`HttpFailure`] and the
//!    original payload in `meta`.
//!
//! The continuation never fails: every transport error is normalised into
//! an [`HttpFailure`] and dispatched like any other action.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::transport::RequestError;

/// Every intent the client understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// `projects/ALL_PROJECTS`
    AllProjects,
    /// `projects/PROJECT_BY_ID`
    ProjectById,
    /// `projects/ADD_PROJECT`
    AddProject,
    /// `projects/UPDATE_PROJECT`
    UpdateProject,
    /// `projects/DELETE_PROJECT`
    DeleteProject,
    /// `tasks/ADD_TASK`
    AddTask,
    /// `tasks/UPDATE_TASK`
    UpdateTask,
    /// `tasks/DELETE_TASK`
    DeleteTask,
    /// `tasks/TASK_COMPLETED_CHANGE`
    TaskCompletedChange,
    /// `requests/CLEAR_HTTP_ERRORS`
    ClearHttpErrors,
    /// Anything else. Reducers leave state untouched.
    Other(String),
}

impl ActionKind {
    const NAMED: [(ActionKind, &'static str); 10] = [
        (Self::AllProjects, "projects/ALL_PROJECTS"),
        (Self::ProjectById, "projects/PROJECT_BY_ID"),
        (Self::AddProject, "projects/ADD_PROJECT"),
        (Self::UpdateProject, "projects/UPDATE_PROJECT"),
        (Self::DeleteProject, "projects/DELETE_PROJECT"),
        (Self::AddTask, "tasks/ADD_TASK"),
        (Self::UpdateTask, "tasks/UPDATE_TASK"),
        (Self::DeleteTask, "tasks/DELETE_TASK"),
        (Self::TaskCompletedChange, "tasks/TASK_COMPLETED_CHANGE"),
        (Self::ClearHttpErrors, "requests/CLEAR_HTTP_ERRORS"),
    ];

    /// The `<domain>/<OPERATION>` name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Other(name) => name,
            known => Self::NAMED
                .iter()
                .find(|(kind, _)| kind == known)
                .map_or("", |(_, name)| *name),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::NAMED
            .into_iter()
            .find(|(_, name)| *name == s)
            .map_or_else(|| Self::Other(s.to_string()), |(kind, _)| kind))
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match name.parse::<ActionKind>() {
            Ok(kind) => Ok(kind),
            Err(never) => match never {},
        }
    }
}

/// Lifecycle stage of a network-backed intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AsyncStage {
    /// The request left; nothing is known yet.
    RequestSent,
    /// The server answered with success.
    ReplyReceived,
    /// The request failed, at the server or on the way.
    FailureReceived,
}

/// Lifecycle metadata of an async intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Which stage this action reports.
    pub async_action: AsyncStage,
    /// The payload the intent was started with. Only set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_payload: Option<Value>,
}

/// Normalised failure, the same shape for every transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpFailure {
    /// Server message or transport error text.
    pub message: String,
    /// HTTP status, when the server answered at all.
    pub status: Option<u16>,
    /// Where the request went.
    pub url: String,
    /// Name of the intent that failed.
    pub action_type: String,
    /// Payload the intent was started with.
    pub original_payload: Value,
}

impl HttpFailure {
    /// Normalises a transport error for the intent `kind`.
    pub fn from_request_error(err: &RequestError, kind: &ActionKind, payload: &Value) -> Self {
        Self {
            message: err.message().to_string(),
            status: err.status(),
            url: err.url().to_string(),
            action_type: kind.to_string(),
            original_payload: payload.clone(),
        }
    }
}

/// What an action carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Intent data, or merged reply data.
    Data(Value),
    /// A failed request.
    Failure(HttpFailure),
}

/// A dispatchable intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    /// Which intent.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Its data.
    pub payload: Payload,
    /// Lifecycle stage, for async intents only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Action {
    /// A plain, synchronous intent.
    pub fn new(kind: ActionKind, payload: Value) -> Self {
        Self {
            kind,
            payload: Payload::Data(payload),
            meta: None,
        }
    }

    /// `CLEAR_HTTP_ERRORS`
    pub fn clear_http_errors() -> Self {
        Self::new(ActionKind::ClearHttpErrors, Value::Null)
    }

    /// `TASK_COMPLETED_CHANGE`, applied locally before the server confirms.
    pub fn task_completed_change(pid: &str, tid: &str, completed: bool) -> Self {
        Self::new(
            ActionKind::TaskCompletedChange,
            serde_json::json!({ "pid": pid, "tid": tid, "completed": completed }),
        )
    }

    /// The lifecycle stage, if this is an async intent.
    pub fn stage(&self) -> Option<AsyncStage> {
        self.meta.as_ref().map(|meta| meta.async_action)
    }

    /// True when entity reducers should apply this action: plain intents and
    /// successful replies.
    pub fn is_committed(&self) -> bool {
        matches!(self.stage(), None | Some(AsyncStage::ReplyReceived))
    }

    /// True for a failure report.
    pub fn is_error(&self) -> bool {
        matches!(self.payload, Payload::Failure(_))
    }

    /// The data payload, `None` for failures.
    pub fn data(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Data(value) => Some(value),
            Payload::Failure(_) => None,
        }
    }

    /// The failure, `None` for data.
    pub fn failure(&self) -> Option<&HttpFailure> {
        match &self.payload {
            Payload::Failure(failure) => Some(failure),
            Payload::Data(_) => None,
        }
    }

    fn stage_of(kind: ActionKind, payload: Payload, stage: AsyncStage) -> Self {
        Self {
            kind,
            payload,
            meta: Some(Meta {
                async_action: stage,
                original_payload: None,
            }),
        }
    }
}

/// Receives actions. Implemented by [`ClientStore`](super::ClientStore).
pub trait Dispatcher: Send + Sync {
    /// Applies one action.
    fn dispatch(&self, action: Action);
}

/// Shallow-merges `response` over `payload` when both are objects;
/// otherwise the response replaces the payload.
pub fn merge(payload: &Value, response: Value) -> Value {
    match (payload, response) {
        (Value::Object(request), Value::Object(reply)) => {
            let mut merged = request.clone();
            merged.extend(reply);
            Value::Object(merged)
        },
        (_, response) => response,
    }
}

/// A network-backed intent that has not started yet.
pub struct AsyncAction {
    kind: ActionKind,
    payload: Value,
    call: BoxFuture<'static, Result<Value, RequestError>>,
}

impl fmt::Debug for AsyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncAction")
            .field("kind", &self.kind)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// Wraps a pending call into an [`AsyncAction`] for the intent `kind`.
///
/// Nothing happens until [`AsyncAction::start`].
pub fn async_action_creator<F>(kind: ActionKind, call: F, payload: Value) -> AsyncAction
where
    F: Future<Output = Result<Value, RequestError>> + Send + 'static,
{
    AsyncAction {
        kind,
        payload,
        call: call.boxed(),
    }
}

impl AsyncAction {
    /// The intent this action reports.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The payload it was created with.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Dispatches `REQUEST_SENT` before returning, then yields the
    /// continuation. Awaiting it drives the call, dispatches the reply or
    /// failure action and resolves to that same action. It never fails.
    pub fn start<D>(self, dispatcher: D) -> impl Future<Output = Action> + Send + 'static
    where
        D: Dispatcher + 'static,
    {
        let Self {
            kind,
            payload,
            call,
        } = self;
        dispatcher.dispatch(Action::stage_of(
            kind.clone(),
            Payload::Data(payload.clone()),
            AsyncStage::RequestSent,
        ));

        async move {
            let settled = settle(kind, payload, call.await);
            dispatcher.dispatch(settled.clone());
            settled
        }
    }
}

/// Builds the final action of an async intent from the call outcome.
pub fn settle(kind: ActionKind, payload: Value, outcome: Result<Value, RequestError>) -> Action {
    match outcome {
        Ok(response) => {
            let merged = merge(&payload, response);
            Action::stage_of(kind, Payload::Data(merged), AsyncStage::ReplyReceived)
        },
        Err(err) => {
            let failure = HttpFailure::from_request_error(&err, &kind, &payload);
            Action {
                kind,
                payload: Payload::Failure(failure),
                meta: Some(Meta {
                    async_action: AsyncStage::FailureReceived,
                    original_payload: Some(payload),
                }),
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Action>>>);

    impl Dispatcher for Recorder {
        fn dispatch(&self, action: Action) {
            self.0.lock().push(action);
        }
    }

    #[test]
    fn kind_names_round_trip() {
        assert_eq!(ActionKind::AddTask.to_string(), "tasks/ADD_TASK");
        assert_eq!(
            "requests/CLEAR_HTTP_ERRORS".parse::<ActionKind>().unwrap(),
            ActionKind::ClearHttpErrors
        );
        assert_eq!(
            "custom/THING".parse::<ActionKind>().unwrap(),
            ActionKind::Other("custom/THING".to_string())
        );
    }

    #[test]
    fn merge_prefers_response() {
        assert_eq!(
            merge(&json!({"pid": "1", "name": "a"}), json!({"name": "b", "tid": "2"})),
            json!({"pid": "1", "name": "b", "tid": "2"})
        );
        assert_eq!(merge(&Value::Null, json!([1, 2])), json!([1, 2]));
    }

    #[tokio::test]
    async fn request_sent_is_dispatched_before_the_call_runs() {
        let recorder = Recorder::default();
        let (tx, rx) = tokio::sync::oneshot::channel::<Value>();
        let action = async_action_creator(
            ActionKind::AddProject,
            async move { Ok(rx.await.unwrap_or(Value::Null)) },
            json!({"name": "n"}),
        );

        let continuation = action.start(recorder.clone());
        {
            let seen = recorder.0.lock();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].stage(), Some(AsyncStage::RequestSent));
        }

        tx.send(json!({"pid": "5"})).unwrap();
        let done = continuation.await;
        assert_eq!(done.stage(), Some(AsyncStage::ReplyReceived));
        assert_eq!(done.data(), Some(&json!({"name": "n", "pid": "5"})));
        assert_eq!(recorder.0.lock().len(), 2);
    }

    #[tokio::test]
    async fn failure_is_normalised_not_thrown() {
        let recorder = Recorder::default();
        let action = async_action_creator(
            ActionKind::DeleteProject,
            async {
                Err(RequestError::Status {
                    status: 404,
                    message: "Item(s) not found".to_string(),
                    url: "http://localhost/data/projects/9".to_string(),
                })
            },
            json!({"pid": "9"}),
        );

        let done = action.start(recorder).await;
        assert!(done.is_error());
        let meta = done.meta.clone().unwrap();
        assert_eq!(meta.async_action, AsyncStage::FailureReceived);
        assert_eq!(meta.original_payload, Some(json!({"pid": "9"})));
        assert_eq!(
            done.failure().unwrap(),
            &HttpFailure {
                message: "Item(s) not found".to_string(),
                status: Some(404),
                url: "http://localhost/data/projects/9".to_string(),
                action_type: "projects/DELETE_PROJECT".to_string(),
                original_payload: json!({"pid": "9"}),
            }
        );
    }
}
