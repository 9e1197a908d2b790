use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::Method;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::GatewayError;
use crate::event::{Body, Headers, NormalizedRequest, NormalizedResponse};
use crate::runtime_config::ExecutionMode;

use super::cors::CorsPolicy;
use super::engine::{EngineRequest, EngineResponse, GraphQlEngine};
use super::scope::{AuthDecoder, RequestScope};
use super::trusted::{TrustedOperationStore, TRUSTED_REJECTION_MESSAGE};

/// Status returned when the adapter or engine crashes.
///
/// Some deployment targets drop or rewrite non-200 function responses, losing
/// the error envelope before the client sees it. Compatibility mode keeps the
/// envelope reachable by returning it under HTTP 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrashStatusPolicy {
    /// HTTP 200 with `{"error": "GraphQL execution failed"}`.
    #[default]
    CompatibilityOk200,
    /// HTTP 500 with the same body.
    Strict500,
}

impl CrashStatusPolicy {
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            CrashStatusPolicy::CompatibilityOk200 => 200,
            CrashStatusPolicy::Strict500 => 500,
        }
    }
}

/// Everything configurable about the GraphQL endpoint besides the engine
/// itself.
#[derive(Default)]
pub struct GraphQlHandlerConfig {
    pub cors: Option<CorsPolicy>,
    pub trusted_operations: Option<TrustedOperationStore>,
    pub crash_status: CrashStatusPolicy,
    pub auth_decoder: Option<Arc<dyn AuthDecoder>>,
    /// Called with the underlying error whenever execution crashes, before
    /// the fixed envelope is returned. Hook for error trackers.
    pub on_exception: Option<Arc<dyn Fn(&GatewayError) + Send + Sync>>,
    pub realtime_enabled: bool,
    pub mode: ExecutionMode,
    /// Origin used to absolutize engine request URLs.
    pub canonical_origin: String,
}

impl GraphQlHandlerConfig {
    #[must_use]
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            canonical_origin: "http://localhost:8911".to_string(),
            ..Default::default()
        }
    }
}

/// The GraphQL endpoint handler: CORS, trusted operations, request scoping,
/// engine invocation, crash containment.
pub struct GraphQlHandler {
    engine: Arc<dyn GraphQlEngine>,
    config: GraphQlHandlerConfig,
}

impl GraphQlHandler {
    pub fn new(engine: Arc<dyn GraphQlEngine>, config: GraphQlHandlerConfig) -> Self {
        Self { engine, config }
    }

    /// Serve one GraphQL request end to end.
    pub fn handle(&self, request: &NormalizedRequest) -> NormalizedResponse {
        let origin = request.headers.get("origin").map(str::to_string);

        // CORS precheck: preflight terminates here, engine never invoked
        if request.method == Method::OPTIONS {
            debug!(request_id = %request.id, "CORS preflight short-circuit");
            let mut response = NormalizedResponse::new(204);
            if let Some(cors) = &self.config.cors {
                cors.apply(origin.as_deref(), &mut response.headers);
            }
            return response;
        }

        // scope entry: the request's identity lives on this stack frame only
        let scope = self.enter_scope(request);

        let body = match self.resolve_operation(request) {
            Ok(body) => body,
            Err(GatewayError::TrustedOperationRejected) => {
                let mut response = NormalizedResponse::json(
                    200,
                    &json!({ "errors": [{ "message": TRUSTED_REJECTION_MESSAGE }] }),
                );
                if let Some(cors) = &self.config.cors {
                    cors.apply(origin.as_deref(), &mut response.headers);
                }
                return response;
            }
            Err(e) => return self.crash(request, origin.as_deref(), e),
        };

        let engine_request = match self.engine_request(request, body) {
            Ok(r) => r,
            Err(e) => return self.crash(request, origin.as_deref(), e),
        };

        info!(
            request_id = %request.id,
            authenticated = scope.current_user.is_some(),
            "GraphQL execution start"
        );
        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.engine.execute(engine_request, &scope)
        }));
        // scope exits when `scope` drops at the end of this call

        match outcome {
            Ok(Ok(engine_response)) => {
                info!(
                    request_id = %request.id,
                    status = engine_response.status,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "GraphQL execution complete"
                );
                self.finish(engine_response, origin.as_deref())
            }
            Ok(Err(e)) => self.crash(request, origin.as_deref(), e),
            Err(panic) => self.crash(
                request,
                origin.as_deref(),
                GatewayError::HandlerCrash {
                    handler: "graphql".to_string(),
                    message: format!("{panic:?}"),
                },
            ),
        }
    }

    fn enter_scope(&self, request: &NormalizedRequest) -> RequestScope {
        let current_user = match &self.config.auth_decoder {
            Some(decoder) => match decoder.decode(request) {
                Ok(user) => user,
                Err(e) => {
                    warn!(
                        request_id = %request.id,
                        scheme = decoder.scheme(),
                        error = %e,
                        "Auth decode failed, continuing unauthenticated"
                    );
                    None
                }
            },
            None => None,
        };
        RequestScope::with_user(request.id, current_user)
    }

    /// Enforce the trusted-operation store, substituting persisted documents
    /// for hashes. Returns the body bytes to hand to the engine.
    fn resolve_operation(&self, request: &NormalizedRequest) -> Result<Vec<u8>, GatewayError> {
        let raw = request
            .body
            .as_ref()
            .map(|b| b.as_bytes().to_vec())
            .unwrap_or_default();

        let Some(store) = &self.config.trusted_operations else {
            return Ok(raw);
        };

        let mut envelope: Value = serde_json::from_slice(&raw)
            .map_err(|e| GatewayError::BodyDecode(e.to_string()))?;

        let hash = envelope
            .pointer("/extensions/persistedQuery/sha256Hash")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(hash) = hash {
            let Some(document) = store.lookup(&hash) else {
                return Err(GatewayError::TrustedOperationRejected);
            };
            envelope["query"] = Value::String(document.to_string());
            return serde_json::to_vec(&envelope)
                .map_err(|e| GatewayError::BodyDecode(e.to_string()));
        }

        let query = envelope.get("query").and_then(Value::as_str).unwrap_or("");
        if store.allows_raw(query, self.config.mode) {
            Ok(raw)
        } else {
            Err(GatewayError::TrustedOperationRejected)
        }
    }

    /// Build the engine request: path plus the inbound query-string
    /// parameters folded into the URL, raw body bytes attached.
    fn engine_request(
        &self,
        request: &NormalizedRequest,
        body: Vec<u8>,
    ) -> Result<EngineRequest, GatewayError> {
        let mut url = Url::parse(&self.config.canonical_origin)
            .and_then(|base| base.join(&request.path))
            .map_err(|e| GatewayError::BodyDecode(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, values) in request.query_params.iter() {
                for value in values {
                    pairs.append_pair(name, value);
                }
            }
        }
        Ok(EngineRequest {
            method: request.method.clone(),
            url,
            headers: request.headers.clone(),
            body,
            realtime: self.config.realtime_enabled,
        })
    }

    /// Normalize engine response headers (lower-cased, de-duplicated names)
    /// and apply CORS.
    fn finish(&self, engine_response: EngineResponse, origin: Option<&str>) -> NormalizedResponse {
        let mut headers = Headers::new();
        for (name, values) in engine_response.headers.iter() {
            for value in values {
                headers.append(name, value.clone());
            }
        }
        if let Some(cors) = &self.config.cors {
            cors.apply(origin, &mut headers);
        }
        let body = if engine_response.body.is_empty() {
            None
        } else {
            Some(match String::from_utf8(engine_response.body) {
                Ok(text) => Body::Text(text),
                Err(e) => Body::Binary(e.into_bytes()),
            })
        };
        NormalizedResponse {
            status: engine_response.status,
            headers,
            body,
        }
    }

    /// Crash path: log the real error, notify the exception hook, return the
    /// fixed envelope under the configured status policy.
    fn crash(
        &self,
        request: &NormalizedRequest,
        origin: Option<&str>,
        err: GatewayError,
    ) -> NormalizedResponse {
        error!(
            request_id = %request.id,
            error = %err,
            policy = ?self.config.crash_status,
            "GraphQL execution failed"
        );
        if let Some(hook) = &self.config.on_exception {
            hook(&err);
        }
        let mut response = NormalizedResponse::json(
            self.config.crash_status.status(),
            &json!({ "error": "GraphQL execution failed" }),
        );
        if let Some(cors) = &self.config.cors {
            cors.apply(origin, &mut response.headers);
        }
        response
    }
}
