//! Request validators.
//!
//! Every validator is a plain function with the [`Validator`] signature. It
//! reads the [`RawRequest`], fails with [`Error::BadRequest`] on the first
//! problem, and otherwise returns the [`Refined`] value with its own field
//! filled in. Validators own disjoint fields, so any order gives the same
//! result.
//!
//! This is also the injection boundary: query options are checked against
//! fixed patterns and mapped onto [`ProjectColumn`] before anything reaches
//! the store.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::request::{Data, Keys, RawRequest, Refined};
use crate::error::{Error, Result};
use crate::types::{Pid, ProjectColumn, ProjectPatch, ProjectQuery, Search, TaskPatch, Tid};

/// A pipeline step.
pub type Validator = fn(&RawRequest, Refined) -> Result<Refined>;

/// Comma-separated list of identifiers.
fn fields_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*\w+\s*(,\s*\w+\s*)*$").expect("valid regex: fields list")
    })
}

/// `column = value`, value made of word characters and spaces.
fn search_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\w+)\s*=\s*(\w[\w\s]*)$").expect("valid regex: search option")
    })
}

/// Parses the `:pid` path segment.
pub fn validate_pid(raw: &RawRequest, refined: Refined) -> Result<Refined> {
    let text = raw
        .params
        .pid
        .as_deref()
        .ok_or_else(|| Error::bad_request("missing pid"))?;
    let pid: Pid = text.parse()?;
    Ok(Refined {
        keys: Keys {
            pid: Some(pid),
            ..refined.keys
        },
        ..refined
    })
}

/// Parses the `:tid` path segment. A task is only addressable through its
/// project, so the `:pid` segment must be present as well.
pub fn validate_tid(raw: &RawRequest, refined: Refined) -> Result<Refined> {
    if raw.params.pid.is_none() {
        return Err(Error::bad_request("missing pid"));
    }
    let text = raw
        .params
        .tid
        .as_deref()
        .ok_or_else(|| Error::bad_request("missing tid"))?;
    let tid: Tid = text.parse()?;
    Ok(Refined {
        keys: Keys {
            tid: Some(tid),
            ..refined.keys
        },
        ..refined
    })
}

/// Checks `fields` and `search` and turns them into a [`ProjectQuery`].
/// An empty value counts as absent. Other query keys are ignored.
pub fn validate_options(raw: &RawRequest, refined: Refined) -> Result<Refined> {
    let option = |key: &str| raw.query.get(key).filter(|value| !value.is_empty());

    let columns = match option("fields") {
        Some(fields) => {
            if !fields_pattern().is_match(fields) {
                return Err(Error::bad_request(format!(
                    "fields must be a comma-separated list of column names, got {fields:?}"
                )));
            }
            let columns = fields
                .split(',')
                .map(str::parse::<ProjectColumn>)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Some(columns)
        },
        None => None,
    };

    let search = match option("search") {
        Some(search) => {
            let captures = search_pattern().captures(search).ok_or_else(|| {
                Error::bad_request(format!(
                    "search must look like column=value, got {search:?}"
                ))
            })?;
            let column: ProjectColumn = captures[1].parse()?;
            Some(Search {
                column,
                needle: captures[2].trim().to_string(),
            })
        },
        None => None,
    };

    Ok(Refined {
        options: ProjectQuery { columns, search },
        ..refined
    })
}

/// Requires a project body with `name` and/or `descr`.
pub fn validate_project_data(raw: &RawRequest, refined: Refined) -> Result<Refined> {
    let body = body_object(raw)?;
    let patch = ProjectPatch {
        name: string_field(body, "name")?,
        descr: string_field(body, "descr")?,
    };
    if patch.is_empty() {
        return Err(Error::bad_request("project body needs name or descr"));
    }
    Ok(Refined {
        data: Data::Project(patch),
        ..refined
    })
}

/// Requires a task body with `descr` and/or `completed`.
pub fn validate_task_data(raw: &RawRequest, refined: Refined) -> Result<Refined> {
    let body = body_object(raw)?;
    let patch = TaskPatch {
        descr: string_field(body, "descr")?,
        completed: body.get("completed").and_then(coerce_bool),
    };
    if patch.is_empty() {
        return Err(Error::bad_request("task body needs descr or completed"));
    }
    Ok(Refined {
        data: Data::Task(patch),
        ..refined
    })
}

fn body_object(raw: &RawRequest) -> Result<&Map<String, Value>> {
    match &raw.body {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(Error::bad_request("body must be a JSON object")),
        None => Err(Error::bad_request("missing body")),
    }
}

fn string_field(body: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::bad_request(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

/// Wire booleans arrive as `true`, `1`, `"1"` or `"true"` depending on the
/// client. `None` means absent.
fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => {
            let s = s.trim();
            Some(!(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")))
        },
        Value::Array(_) | Value::Object(_) => Some(true),
    }
}
