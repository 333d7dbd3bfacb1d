//! Validate, execute, respond.
//!
//! [`handle_request`] pairs a fixed list of validators with one
//! [`Operation`]. Running the resulting [`Pipeline`] applies every validator
//! in order, stops at the first rejection, executes the operation and turns
//! the outcome into a transport-neutral [`Reply`]. A panic anywhere in that
//! sequence is caught and answered with a 500, which keeps it apart from the
//! deliberate 400/404 rejections.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;
use tracing::{error, warn};

use super::request::{RawRequest, Refined};
use super::transactions::Operation;
use super::validators::Validator;
use crate::error::{Error, Result, INTERNAL_MESSAGE};
use crate::store::ProjectStore;

/// Body of a [`Reply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// Success payload.
    Json(Value),
    /// Plain-text failure message.
    Text(String),
}

/// Status and body, independent of how they will be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: ReplyBody,
}

impl Reply {
    /// `200` with a JSON body.
    pub fn ok(value: Value) -> Self {
        Self {
            status: 200,
            body: ReplyBody::Json(value),
        }
    }

    /// Any status with a plain-text body.
    pub fn text(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ReplyBody::Text(message.into()),
        }
    }

    /// The reply for a typed failure.
    pub fn from_error(err: &Error) -> Self {
        Self::text(err.status_code(), err.public_message())
    }

    /// True for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The JSON payload, if this is a success.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ReplyBody::Json(value) => Some(value),
            ReplyBody::Text(_) => None,
        }
    }

    /// The text payload, if this is a failure.
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            ReplyBody::Text(text) => Some(text),
            ReplyBody::Json(_) => None,
        }
    }
}

/// A route's validators plus its handler.
#[derive(Clone, Copy)]
pub struct Pipeline {
    validators: &'static [Validator],
    operation: Operation,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("validators", &self.validators.len())
            .field("operation", &self.operation)
            .finish()
    }
}

/// Builds a pipeline that runs `validators` and then `operation`.
pub const fn handle_request(validators: &'static [Validator], operation: Operation) -> Pipeline {
    Pipeline {
        validators,
        operation,
    }
}

impl Pipeline {
    /// The operation this pipeline ends in.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Runs only the validators.
    pub fn validate(&self, raw: &RawRequest) -> Result<Refined> {
        self.validators
            .iter()
            .try_fold(Refined::default(), |refined, validator| validator(raw, refined))
    }

    /// Runs the full pipeline and never fails: every outcome is a [`Reply`].
    pub async fn execute(&self, store: &dyn ProjectStore, raw: RawRequest) -> Reply {
        let operation = self.operation;
        let outcome = AssertUnwindSafe(async {
            let refined = self.validate(&raw)?;
            operation.execute(store, refined).await
        })
        .catch_unwind()
        .await;

        match outcome {
            Ok(Ok(value)) => Reply::ok(value),
            Ok(Err(err)) => {
                match &err {
                    Error::Storage(_) | Error::Internal(_) => {
                        error!(operation = operation.name(), error = %err, "request failed");
                    },
                    Error::BadRequest(_) | Error::NotFound => {
                        warn!(operation = operation.name(), error = %err, "request rejected");
                    },
                }
                Reply::from_error(&err)
            },
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(operation = operation.name(), panic = %detail, "handler panicked");
                Reply::text(500, INTERNAL_MESSAGE)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::validators::{validate_pid, validate_project_data};
    use crate::store::SqliteStore;
    use serde_json::json;

    fn exploding(_: &RawRequest, _: Refined) -> Result<Refined> {
        panic!("validator bug")
    }

    static UPDATE: Pipeline = handle_request(
        &[validate_pid, validate_project_data],
        Operation::UpdateProject,
    );

    #[tokio::test]
    async fn first_rejection_short_circuits() {
        let store = SqliteStore::open_in_memory().unwrap();
        let raw = RawRequest::with_params(Some("abc"), None);
        let reply = UPDATE.execute(&store, raw).await;
        assert_eq!(reply.status, 400);
        assert!(reply.message().unwrap().contains("pid must be an integer"));
    }

    #[tokio::test]
    async fn missing_row_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let raw = RawRequest::with_params(Some("99"), None).body(json!({"name": "x"}));
        let reply = UPDATE.execute(&store, raw).await;
        assert_eq!(reply, Reply::text(404, "Item(s) not found"));
    }

    #[tokio::test]
    async fn panic_becomes_internal_error() {
        static BROKEN: Pipeline = handle_request(&[exploding], Operation::AllProjects);
        let store = SqliteStore::open_in_memory().unwrap();
        let reply = BROKEN.execute(&store, RawRequest::default()).await;
        assert_eq!(reply, Reply::text(500, INTERNAL_MESSAGE));
    }
}
