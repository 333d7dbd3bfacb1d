//! Request values threaded through the pipeline.
//!
//! A transport produces a [`RawRequest`]: strings and JSON exactly as they
//! arrived. Validators never modify it. Each one takes the current
//! [`Refined`] by value and returns a new one carrying the field it owns, so
//! what a handler can rely on is visible in the types rather than in the
//! order side effects happened.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{Pid, ProjectPatch, ProjectQuery, TaskPatch, Tid};

/// Path parameters captured by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    /// `:pid` segment, if the route has one.
    pub pid: Option<String>,
    /// `:tid` segment, if the route has one.
    pub tid: Option<String>,
}

/// A request as a transport handed it over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    /// Path parameters.
    pub params: PathParams,
    /// Decoded query string. A repeated key keeps its last value.
    pub query: HashMap<String, String>,
    /// Parsed JSON body; `None` when the request had none.
    pub body: Option<Value>,
}

impl RawRequest {
    /// Request with only path parameters.
    pub fn with_params(pid: Option<&str>, tid: Option<&str>) -> Self {
        Self {
            params: PathParams {
                pid: pid.map(str::to_string),
                tid: tid.map(str::to_string),
            },
            ..Default::default()
        }
    }

    /// Adds a JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds one query option.
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }
}

/// Typed path keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keys {
    /// Parsed project id.
    pub pid: Option<Pid>,
    /// Parsed task id.
    pub tid: Option<Tid>,
}

/// Validated mutation body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Data {
    /// No body was validated for this route.
    #[default]
    None,
    /// Project fields.
    Project(ProjectPatch),
    /// Task fields.
    Task(TaskPatch),
}

/// The validated `{keys, data, options}` triple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refined {
    /// Path keys.
    pub keys: Keys,
    /// Mutation body.
    pub data: Data,
    /// Listing options.
    pub options: ProjectQuery,
}

impl Refined {
    /// The project id, or an internal error if no validator produced one.
    pub fn pid(&self) -> Result<Pid> {
        self.keys
            .pid
            .ok_or_else(|| Error::internal("route handler ran without a validated pid"))
    }

    /// The task id, or an internal error if no validator produced one.
    pub fn tid(&self) -> Result<Tid> {
        self.keys
            .tid
            .ok_or_else(|| Error::internal("route handler ran without a validated tid"))
    }

    /// The project body, or an internal error if none was validated.
    pub fn project_data(&self) -> Result<&ProjectPatch> {
        match &self.data {
            Data::Project(patch) => Ok(patch),
            _ => Err(Error::internal("route handler ran without a project body")),
        }
    }

    /// The task body, or an internal error if none was validated.
    pub fn task_data(&self) -> Result<&TaskPatch> {
        match &self.data {
            Data::Task(patch) => Ok(patch),
            _ => Err(Error::internal("route handler ran without a task body")),
        }
    }
}
