use http::Method;
use url::Url;

use crate::error::GatewayError;
use crate::event::Headers;

use super::scope::RequestScope;

/// The request shape handed to the engine: a Fetch-style URL (query-string
/// parameters from the inbound event folded in), raw body bytes, and the
/// per-request scope.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Vec<u8>,
    /// Whether realtime (subscription/defer) features are enabled for this
    /// deployment. The engine decides what to do with it.
    pub realtime: bool,
}

/// The engine's raw response before the adapter normalizes headers and
/// applies CORS.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl EngineResponse {
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        let mut headers = Headers::new();
        headers.set("content-type", "application/json");
        Self {
            status,
            headers,
            body: body.to_string().into_bytes(),
        }
    }
}

/// The external GraphQL engine the adapter wraps.
///
/// Implementations receive the per-request [`RequestScope`] by reference for
/// the duration of one call and must not retain it: the scope is owned by the
/// adapter's stack frame and dropped when the request finishes. Resolver code
/// reads the authenticated user from the scope, which is why two concurrent
/// requests can never observe each other's user.
pub trait GraphQlEngine: Send + Sync {
    fn execute(
        &self,
        request: EngineRequest,
        scope: &RequestScope,
    ) -> Result<EngineResponse, GatewayError>;
}
