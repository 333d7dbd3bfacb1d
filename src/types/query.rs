//! Column projection and search options for `GET /projects`.
//!
//! Column names never travel from the client into SQL text. The client's
//! words are mapped onto [`ProjectColumn`], a closed set whose SQL tokens
//! are fixed here; search needles are always bound as parameters.

use std::fmt;
use std::str::FromStr;

/// A column of the projects-with-pending view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectColumn {
    /// `pid`
    Pid,
    /// `name`
    Name,
    /// `descr`
    Descr,
    /// `pending` (derived count of incomplete tasks)
    Pending,
}

impl ProjectColumn {
    /// All columns, in the order `SELECT *` returns them.
    pub const ALL: [ProjectColumn; 4] = [Self::Pid, Self::Name, Self::Descr, Self::Pending];

    /// The fixed SQL token for this column.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Pid => "pid",
            Self::Name => "name",
            Self::Descr => "descr",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for ProjectColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Returned when a client names a column the view does not have.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown column {0:?}")]
pub struct UnknownColumn(pub String);

impl FromStr for ProjectColumn {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.as_sql().eq_ignore_ascii_case(word))
            .ok_or_else(|| UnknownColumn(word.to_string()))
    }
}

/// `column LIKE %needle%` over one column of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    /// Column to match against.
    pub column: ProjectColumn,
    /// Substring to look for. Bound as a parameter, never inlined.
    pub needle: String,
}

/// Validated options for listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectQuery {
    /// Columns to return; `None` returns all of them.
    pub columns: Option<Vec<ProjectColumn>>,
    /// Optional single-column filter.
    pub search: Option<Search>,
}

impl ProjectQuery {
    /// True when neither projection nor search was requested.
    pub fn is_plain(&self) -> bool {
        self.columns.is_none() && self.search.is_none()
    }

    /// The columns this query returns.
    pub fn selected(&self) -> &[ProjectColumn] {
        self.columns.as_deref().unwrap_or(&ProjectColumn::ALL)
    }
}
