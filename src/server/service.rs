use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::error::GatewayError;
use crate::event::FetchRequest;
use crate::graphql::GraphQlHandler;
use crate::render::RenderCoordinator;

use super::request::normalize_request;
use super::response::{write_fetch_response, write_json_error, write_normalized_response};

/// The gateway's HTTP service: one instance per connection coroutine,
/// sharing state through `Arc`.
pub struct GatewayService {
    pub dispatcher: Arc<Dispatcher>,
    pub graphql: Option<Arc<GraphQlHandler>>,
    pub coordinator: Option<Arc<RenderCoordinator>>,
    /// Path prefix for function invocation, e.g. `/fn`.
    pub function_prefix: String,
    /// Keeps the dev hot-reload watcher alive for the server's lifetime.
    pub watcher: Option<notify::RecommendedWatcher>,
}

impl Clone for GatewayService {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            graphql: self.graphql.clone(),
            coordinator: self.coordinator.clone(),
            function_prefix: self.function_prefix.clone(),
            watcher: None,
        }
    }
}

impl GatewayService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            graphql: None,
            coordinator: None,
            function_prefix: "/fn".to_string(),
            watcher: None,
        }
    }

    pub fn with_graphql(mut self, graphql: Arc<GraphQlHandler>) -> Self {
        self.graphql = Some(graphql);
        self
    }

    pub fn with_coordinator(mut self, coordinator: Arc<RenderCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    pub fn with_watcher(mut self, watcher: notify::RecommendedWatcher) -> Self {
        self.watcher = Some(watcher);
        self
    }
}

impl HttpService for GatewayService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = match normalize_request(req) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Request normalization failed");
                write_json_error(res, e.status(), json!({ "error": "Malformed request" }));
                return Ok(());
            }
        };

        if request.method == http::Method::GET && request.path == "/health" {
            write_json_error(res, 200, json!({ "status": "ok" }));
            return Ok(());
        }

        // function invocation paths
        if request.path.starts_with(&self.function_prefix) {
            let response = if request.route_name() == "graphql" {
                match &self.graphql {
                    Some(graphql) => graphql.handle(&request),
                    None => self.dispatcher.dispatch(&request),
                }
            } else {
                self.dispatcher.dispatch(&request)
            };
            write_normalized_response(res, &response);
            return Ok(());
        }

        // page routes
        let Some(coordinator) = &self.coordinator else {
            write_json_error(res, 404, json!({ "error": "Not Found", "path": request.path }));
            return Ok(());
        };

        let origin = format!(
            "http://{}",
            request.headers.get("host").unwrap_or("localhost")
        );
        let fetch_request = match FetchRequest::from_normalized(&request, &origin) {
            Ok(r) => r,
            Err(e) => {
                write_json_error(res, e.status(), json!({ "error": "Malformed request" }));
                return Ok(());
            }
        };

        match coordinator.handle(&fetch_request) {
            Ok(response) => write_fetch_response(res, response),
            Err(e @ GatewayError::RouteNotFound { .. }) => {
                debug!(path = %request.path, "Page route not found");
                write_json_error(res, e.status(), json!({ "error": "Not Found" }));
            }
            Err(e) => {
                warn!(request_id = %request.id, error = %e, "Page pipeline failed");
                write_json_error(res, e.status(), json!({ "error": "Internal Server Error" }));
            }
        }
        Ok(())
    }
}
