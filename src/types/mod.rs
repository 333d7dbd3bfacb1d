//! Domain types shared by the store, the server pipeline and the client.

pub mod ids;
pub mod project;
pub mod query;
pub mod task;

pub use ids::{InvalidId, Pid, Tid};
pub use project::{
    NewProject, ProjectDetail, ProjectPatch, ProjectRecord, ProjectSummary, DEFAULT_DESCRIPTION,
    DEFAULT_PROJECT_NAME,
};
pub use query::{ProjectColumn, ProjectQuery, Search, UnknownColumn};
pub use task::{NewTask, TaskPatch, TaskRecord, TaskSummary};
