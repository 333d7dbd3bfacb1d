//! Client side: normalised state kept in sync with the server.
//!
//! # Architecture
//!
//! 1. **[`ProjectsApi`]** -- builds an [`AsyncAction`] per intent over an
//!    injected [`Transport`].
//! 2. **[`action`]** -- [`async_action_creator`] emits `REQUEST_SENT`, then
//!    `REPLY_RECEIVED` or `FAILURE_RECEIVED`, never an error.
//! 3. **[`reducers`]** -- projects, tasks and request-lifecycle tables.
//! 4. **[`ClientStore`]** -- applies actions one at a time and publishes the
//!    new state on a `watch` channel for whatever renders it.

pub mod action;
pub mod api;
pub mod reducers;
pub mod store;
pub mod transport;

pub use action::{
    async_action_creator, merge, Action, ActionKind, AsyncAction, AsyncStage, Dispatcher,
    HttpFailure, Meta, Payload,
};
pub use api::{CompletionChange, ProjectsApi};
pub use reducers::{AppState, ProjectEntry, RequestsState, TaskEntry};
pub use store::ClientStore;
#[cfg(feature = "http-client")]
pub use transport::HttpTransport;
pub use transport::{IpcTransport, RequestError, Transport};
