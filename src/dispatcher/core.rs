use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, error, info};

use crate::error::GatewayError;
use crate::event::{
    lambda_event_from_normalized, lambda_result_to_normalized, Body, NormalizedRequest,
    NormalizedResponse,
};
use crate::registry::FunctionRegistry;
use crate::runtime_config::ExecutionMode;

/// Escape `&`, `<`, `>`, `"` and `'` for embedding untrusted text in HTML.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Routes normalized requests to registry functions.
pub struct Dispatcher {
    registry: Arc<FunctionRegistry>,
    mode: ExecutionMode,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<FunctionRegistry>, mode: ExecutionMode) -> Self {
        Self { registry, mode }
    }

    /// Dispatch one request. Always produces a response; handler failures
    /// become 500s here rather than propagating.
    pub fn dispatch(&self, request: &NormalizedRequest) -> NormalizedResponse {
        let route_name = request.route_name().to_string();
        let snapshot = self.registry.snapshot();

        debug!(
            request_id = %request.id,
            route_name = %route_name,
            available_functions = snapshot.len(),
            "Function lookup"
        );

        let handler = match snapshot.get(&route_name).and_then(|e| e.handler.clone()) {
            Some(handler) => handler,
            None => {
                error!(
                    request_id = %request.id,
                    route_name = %route_name,
                    "Function not found"
                );
                return self.not_found(&route_name, snapshot.route_names());
            }
        };

        let event = lambda_event_from_normalized(request);
        let start = Instant::now();
        info!(
            request_id = %request.id,
            route_name = %route_name,
            method = %request.method,
            path = %request.path,
            "Request dispatched to function"
        );

        let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(event)));

        match outcome {
            Ok(Ok(result)) => {
                info!(
                    request_id = %request.id,
                    route_name = %route_name,
                    status = result.status_code,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Function response received"
                );
                match lambda_result_to_normalized(&result) {
                    Ok(response) => response,
                    Err(e) => self.crash_response(request, &route_name, &e.to_string()),
                }
            }
            Ok(Err(e)) => self.crash_response(request, &route_name, &e.to_string()),
            Err(panic) => self.crash_response(request, &route_name, &format!("{panic:?}")),
        }
    }

    fn crash_response(
        &self,
        request: &NormalizedRequest,
        route_name: &str,
        message: &str,
    ) -> NormalizedResponse {
        let err = GatewayError::HandlerCrash {
            handler: route_name.to_string(),
            message: message.to_string(),
        };
        error!(
            request_id = %request.id,
            route_name = %route_name,
            error = %err,
            "Function crashed"
        );
        NormalizedResponse::json(500, &json!({ "error": "Function execution failed" }))
    }

    fn not_found(&self, route_name: &str, available: Vec<String>) -> NormalizedResponse {
        let message = format!("Function \"{}\" was not found.", escape_html(route_name));
        if self.mode.is_development() {
            NormalizedResponse::json(
                404,
                &json!({
                    "error": message,
                    "availableFunctions": available,
                }),
            )
        } else {
            let mut response = NormalizedResponse::new(404);
            response.headers.set("content-type", "text/html; charset=utf-8");
            response.body = Some(Body::Text(message));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }
}
