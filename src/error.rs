//! Gateway error taxonomy.
//!
//! Every request-path failure maps to one of these variants. The general rule
//! is that an error stays local to the request that caused it: the dispatcher
//! and the render coordinator convert these into responses, and only a
//! filesystem enumeration failure during registry construction is allowed to
//! abort startup.

use thiserror::Error;

/// Errors produced while translating or serving a single request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The inbound transport body claimed an encoding it does not satisfy.
    /// Surfaced as HTTP 400.
    #[error("malformed request body encoding: {0}")]
    BodyDecode(String),

    /// No handler or page route matched the request. Surfaced as HTTP 404;
    /// diagnostic detail (the registered route names) is included in
    /// development mode only.
    #[error("route \"{route}\" was not found")]
    RouteNotFound { route: String },

    /// A handler raised an uncaught error or panicked. Surfaced as HTTP 500,
    /// except in the GraphQL adapter's compatibility mode (see
    /// [`crate::graphql::CrashStatusPolicy`]).
    #[error("handler \"{handler}\" crashed: {message}")]
    HandlerCrash { handler: String, message: String },

    /// An arbitrary (non-persisted) operation was submitted while the
    /// trusted-operation store is enforced. Reported as a GraphQL-level
    /// error in the response envelope, not as an HTTP error.
    #[error("operation is not in the trusted operation store")]
    TrustedOperationRejected,

    /// A middleware raised; propagates up to the render coordinator which
    /// converts it into a 500.
    #[error("middleware failed: {0}")]
    MiddlewareCrash(String),

    /// The streaming render failed; the coordinator falls back to the static
    /// fallback document rather than a bare error page.
    #[error("render failed: {0}")]
    Render(String),

    /// Function discovery could not enumerate the filesystem. The only error
    /// allowed to abort startup.
    #[error("function discovery failed: {0}")]
    Discovery(#[from] std::io::Error),
}

impl GatewayError {
    /// HTTP status this error surfaces as, outside of compatibility modes.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::BodyDecode(_) => 400,
            GatewayError::RouteNotFound { .. } => 404,
            GatewayError::HandlerCrash { .. }
            | GatewayError::MiddlewareCrash(_)
            | GatewayError::Render(_)
            | GatewayError::Discovery(_) => 500,
            // GraphQL-level, carried inside a 200 envelope
            GatewayError::TrustedOperationRejected => 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::BodyDecode("bad".into()).status(), 400);
        assert_eq!(
            GatewayError::RouteNotFound {
                route: "missing".into()
            }
            .status(),
            404
        );
        assert_eq!(
            GatewayError::HandlerCrash {
                handler: "h".into(),
                message: "boom".into()
            }
            .status(),
            500
        );
    }
}
