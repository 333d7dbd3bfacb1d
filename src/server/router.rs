//! Resolves `(method, path)` to a pipeline and runs it.
//!
//! [`ProjectRouter`] is shared by every transport. It owns the store and the
//! configured base path, matches requests against one static route table and
//! hands the pipeline a [`RawRequest`] built from path segments, the decoded
//! query string and the JSON body.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use tracing::debug;

use super::pipeline::{handle_request, Pipeline, Reply};
use super::request::{PathParams, RawRequest};
use super::transactions::Operation;
use super::validators::{
    validate_options, validate_pid, validate_project_data, validate_task_data, validate_tid,
    Validator,
};
use crate::store::ProjectStore;

/// Which level of the resource tree a path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    /// `/projects`
    Collection,
    /// `/projects/:pid`
    Project,
    /// `/projects/:pid/:tid`
    Task,
}

struct Route {
    resource: Resource,
    method: Method,
    pipeline: Pipeline,
}

const OPTIONS: &[Validator] = &[validate_options];
const PROJECT_BODY: &[Validator] = &[validate_project_data];
const PID: &[Validator] = &[validate_pid];
const PID_PROJECT_BODY: &[Validator] = &[validate_pid, validate_project_data];
const PID_TASK_BODY: &[Validator] = &[validate_pid, validate_task_data];
const PID_TID: &[Validator] = &[validate_pid, validate_tid];
const PID_TID_TASK_BODY: &[Validator] = &[validate_pid, validate_tid, validate_task_data];

static ROUTES: [Route; 9] = [
    Route {
        resource: Resource::Collection,
        method: Method::GET,
        pipeline: handle_request(OPTIONS, Operation::AllProjects),
    },
    Route {
        resource: Resource::Collection,
        method: Method::POST,
        pipeline: handle_request(PROJECT_BODY, Operation::AddProject),
    },
    Route {
        resource: Resource::Project,
        method: Method::GET,
        pipeline: handle_request(PID, Operation::ProjectById),
    },
    Route {
        resource: Resource::Project,
        method: Method::POST,
        pipeline: handle_request(PID_TASK_BODY, Operation::AddTask),
    },
    Route {
        resource: Resource::Project,
        method: Method::PUT,
        pipeline: handle_request(PID_PROJECT_BODY, Operation::UpdateProject),
    },
    Route {
        resource: Resource::Project,
        method: Method::DELETE,
        pipeline: handle_request(PID, Operation::DeleteProject),
    },
    Route {
        resource: Resource::Task,
        method: Method::GET,
        pipeline: handle_request(PID_TID, Operation::TaskById),
    },
    Route {
        resource: Resource::Task,
        method: Method::PUT,
        pipeline: handle_request(PID_TID_TASK_BODY, Operation::UpdateTask),
    },
    Route {
        resource: Resource::Task,
        method: Method::DELETE,
        pipeline: handle_request(PID_TID, Operation::DeleteTask),
    },
];

/// Body for paths outside the resource tree.
pub const ROUTE_NOT_FOUND: &str = "Not found";

/// Body for a known path with an unsupported method.
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Transport-neutral entry point to the REST surface.
#[derive(Clone)]
pub struct ProjectRouter {
    store: Arc<dyn ProjectStore>,
    base_path: String,
}

impl std::fmt::Debug for ProjectRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRouter")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

impl ProjectRouter {
    /// Creates a router serving `{base_path}/projects`.
    ///
    /// `base_path` is expected in normalised form: empty, or starting with
    /// `/` and without a trailing slash.
    pub fn new(store: Arc<dyn ProjectStore>, base_path: impl Into<String>) -> Self {
        Self {
            store,
            base_path: base_path.into(),
        }
    }

    /// The store shared by every request.
    pub fn store(&self) -> &Arc<dyn ProjectStore> {
        &self.store
    }

    /// The path prefix in front of `/projects`.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Handles a request whose body has already been parsed.
    pub async fn handle(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let (pipeline, params) = match self.resolve(method, path) {
            Ok(found) => found,
            Err(reply) => {
                debug!(%method, path, status = reply.status, "no route");
                return reply;
            },
        };
        let raw = RawRequest {
            params,
            query: parse_query(query),
            body,
        };
        let reply = pipeline.execute(self.store.as_ref(), raw).await;
        debug!(%method, path, status = reply.status, "handled");
        reply
    }

    /// Handles a request with a raw body. An empty body is no body; anything
    /// else must be valid JSON.
    pub async fn handle_bytes(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        body: &[u8],
    ) -> Reply {
        match parse_body(body) {
            Ok(body) => self.handle(method, path, query, body).await,
            Err(reply) => reply,
        }
    }

    /// Handles a target of the form `path?query`.
    pub async fn handle_target(&self, method: &Method, target: &str, body: Option<Value>) -> Reply {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        self.handle(method, path, query, body).await
    }

    fn resolve(&self, method: &Method, path: &str) -> Result<(Pipeline, PathParams), Reply> {
        let not_found = || Reply::text(404, ROUTE_NOT_FOUND);
        let rest = path.strip_prefix(self.base_path.as_str()).ok_or_else(not_found)?;
        let rest = rest.strip_prefix('/').ok_or_else(not_found)?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let segments: Vec<&str> = rest.split('/').collect();
        let (resource, params) = match segments.as_slice() {
            ["projects"] => (Resource::Collection, PathParams::default()),
            ["projects", pid] if !pid.is_empty() => (
                Resource::Project,
                PathParams {
                    pid: Some((*pid).to_string()),
                    tid: None,
                },
            ),
            ["projects", pid, tid] if !pid.is_empty() && !tid.is_empty() => (
                Resource::Task,
                PathParams {
                    pid: Some((*pid).to_string()),
                    tid: Some((*tid).to_string()),
                },
            ),
            _ => return Err(not_found()),
        };

        ROUTES
            .iter()
            .find(|route| route.resource == resource && route.method == *method)
            .map(|route| (route.pipeline, params))
            .ok_or_else(|| Reply::text(405, METHOD_NOT_ALLOWED))
    }
}

/// Parses a request body. Whitespace-only counts as absent.
pub fn parse_body(body: &[u8]) -> Result<Option<Value>, Reply> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| Reply::text(400, format!("Bad request: body is not valid JSON ({e})")))
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn router(base: &str) -> ProjectRouter {
        ProjectRouter::new(Arc::new(SqliteStore::open_in_memory().unwrap()), base)
    }

    #[test]
    fn resolves_every_level() {
        let router = router("/data");
        let (pipeline, params) = router.resolve(&Method::GET, "/data/projects").unwrap();
        assert_eq!(pipeline.operation(), Operation::AllProjects);
        assert_eq!(params, PathParams::default());

        let (pipeline, params) = router.resolve(&Method::PUT, "/data/projects/7/").unwrap();
        assert_eq!(pipeline.operation(), Operation::UpdateProject);
        assert_eq!(params.pid.as_deref(), Some("7"));

        let (pipeline, params) = router.resolve(&Method::DELETE, "/data/projects/7/3").unwrap();
        assert_eq!(pipeline.operation(), Operation::DeleteTask);
        assert_eq!(params.tid.as_deref(), Some("3"));
    }

    #[test]
    fn unknown_path_and_method() {
        let router = router("/data");
        assert_eq!(
            router.resolve(&Method::GET, "/projects").unwrap_err().status,
            404
        );
        assert_eq!(
            router.resolve(&Method::GET, "/data/projects/1/2/3").unwrap_err().status,
            404
        );
        assert_eq!(
            router.resolve(&Method::GET, "/database/projects").unwrap_err().status,
            404
        );
        assert_eq!(
            router.resolve(&Method::PATCH, "/data/projects/1").unwrap_err(),
            Reply::text(405, METHOD_NOT_ALLOWED)
        );
        assert_eq!(
            router.resolve(&Method::POST, "/data/projects/1/2").unwrap_err().status,
            405
        );
    }

    #[test]
    fn empty_base_path() {
        let router = router("");
        assert!(router.resolve(&Method::GET, "/projects").is_ok());
    }

    #[test]
    fn body_parsing() {
        assert_eq!(parse_body(b"").unwrap(), None);
        assert_eq!(parse_body(b"  \n").unwrap(), None);
        assert!(parse_body(br#"{"name":"x"}"#).unwrap().is_some());
        assert_eq!(parse_body(b"{name:").unwrap_err().status, 400);
    }

    #[test]
    fn query_decoding() {
        let query = parse_query(Some("fields=name%2Cdescr&search=descr%3Dweb+dev"));
        assert_eq!(query["fields"], "name,descr");
        assert_eq!(query["search"], "descr=web dev");
    }
}
