use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::GatewayError;
use crate::event::{Body, FetchRequest, Headers};

/// Authentication state accumulated by the chain.
///
/// Starts unauthenticated; an auth middleware that validates a session fills
/// it in, and the coordinator forwards it to the renderer.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub current_user: Option<Value>,
}

/// The response accumulator a chain writes into.
///
/// A fresh accumulator is a pass-through: status 200, no headers, no body.
/// It only becomes a real response when some middleware gives it a body or
/// turns it into a redirect.
#[derive(Debug, Clone)]
pub struct MiddlewareResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Option<Body>,
}

impl Default for MiddlewareResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Headers::new(),
            body: None,
        }
    }
}

impl MiddlewareResponse {
    #[must_use]
    pub fn pass_through() -> Self {
        Self::default()
    }

    /// Turn the accumulator into a redirect.
    pub fn redirect(&mut self, status: u16, location: &str) {
        self.status = status;
        self.headers.set("location", location);
        self.body = None;
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.headers.contains("location")
    }

    /// Whether this response ends the chain (and the request).
    #[must_use]
    pub fn short_circuits(&self) -> bool {
        self.is_redirect() || self.body.is_some()
    }
}

/// One link in a route's middleware chain.
pub trait Middleware: Send + Sync {
    /// Name for log lines.
    fn name(&self) -> &str;

    fn process(
        &self,
        request: &FetchRequest,
        response: &mut MiddlewareResponse,
        auth: &mut AuthState,
    ) -> Result<(), GatewayError>;
}

/// Run a chain in order against one request.
///
/// Stops early when a middleware short-circuits. Errors and panics surface
/// as [`GatewayError::MiddlewareCrash`]; the caller decides how to respond.
pub fn invoke(
    chain: &[Arc<dyn Middleware>],
    request: &FetchRequest,
) -> Result<(MiddlewareResponse, AuthState), GatewayError> {
    let mut response = MiddlewareResponse::pass_through();
    let mut auth = AuthState::default();

    for mw in chain {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            mw.process(request, &mut response, &mut auth)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(GatewayError::MiddlewareCrash(format!(
                    "{}: {e}",
                    mw.name()
                )));
            }
            Err(panic) => {
                return Err(GatewayError::MiddlewareCrash(format!(
                    "{} panicked: {panic:?}",
                    mw.name()
                )));
            }
        }
        if response.short_circuits() {
            debug!(middleware = mw.name(), status = response.status, "Middleware short-circuit");
            break;
        }
    }

    Ok((response, auth))
}
