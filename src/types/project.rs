//! Project records and the shapes they take on the wire.

use serde::{Deserialize, Serialize};

use super::ids::Pid;
use super::task::TaskSummary;

/// Name given to a project created without one.
pub const DEFAULT_PROJECT_NAME: &str = "New Project";

/// Description given to a project or task created without one.
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// A project row as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Surrogate key.
    pub pid: Pid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub descr: String,
}

/// One entry of `GET /projects`.
///
/// Every field is optional because the caller may project a subset of
/// columns with `?fields=`. Absent fields are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Surrogate key, as a string on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<Pid>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    /// Number of tasks not yet completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<i64>,
}

/// `GET /projects/:pid`: the project row plus its tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetail {
    /// Surrogate key.
    pub pid: Pid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub descr: String,
    /// Tasks belonging to this project, in insertion order.
    pub tasks: Vec<TaskSummary>,
}

impl ProjectDetail {
    /// Assembles the detail view from a stored row and its tasks.
    pub fn new(record: ProjectRecord, tasks: Vec<TaskSummary>) -> Self {
        Self {
            pid: record.pid,
            name: record.name,
            descr: record.descr,
            tasks,
        }
    }
}

/// Values for a project insert, defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub descr: String,
}

/// Validated project mutation: only the fields the client sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    /// New name, if changed.
    pub name: Option<String>,
    /// New description, if changed.
    pub descr: Option<String>,
}

impl ProjectPatch {
    /// True when no mutable field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.descr.is_none()
    }

    /// Fills absent fields with the insert defaults.
    pub fn into_new(self) -> NewProject {
        NewProject {
            name: self.name.unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            descr: self.descr.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_omits_unprojected_fields() {
        let summary = ProjectSummary {
            name: Some("Omelette".to_string()),
            pending: Some(3),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({"name": "Omelette", "pending": 3})
        );
    }

    #[test]
    fn patch_defaults_apply_on_insert() {
        let new = ProjectPatch {
            name: None,
            descr: Some("d".to_string()),
        }
        .into_new();
        assert_eq!(new.name, DEFAULT_PROJECT_NAME);
        assert_eq!(new.descr, "d");
        assert!(ProjectPatch::default().is_empty());
    }
}
