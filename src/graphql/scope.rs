use serde_json::Value;

use crate::error::GatewayError;
use crate::event::NormalizedRequest;
use crate::ids::RequestId;

/// Per-request execution scope.
///
/// Created when a request enters the adapter and dropped when it leaves.
/// Owned by the request's coroutine stack and passed by reference into the
/// engine; there is deliberately no global registry of scopes, so state from
/// one request cannot leak into another under interleaved execution.
#[derive(Debug, Clone)]
pub struct RequestScope {
    pub request_id: RequestId,
    /// Decoded identity of the caller, when an auth decoder produced one.
    pub current_user: Option<Value>,
}

impl RequestScope {
    #[must_use]
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            current_user: None,
        }
    }

    #[must_use]
    pub fn with_user(request_id: RequestId, current_user: Option<Value>) -> Self {
        Self {
            request_id,
            current_user,
        }
    }
}

/// Decodes the caller's identity from the inbound request.
///
/// Invoked once per request during scope construction. A decode failure is
/// not a request failure: the scope simply carries no user and resolvers see
/// an unauthenticated caller.
pub trait AuthDecoder: Send + Sync {
    /// The auth scheme this decoder handles, for log lines.
    fn scheme(&self) -> &str;

    fn decode(&self, request: &NormalizedRequest) -> Result<Option<Value>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_starts_unauthenticated() {
        let scope = RequestScope::new(RequestId::new());
        assert!(scope.current_user.is_none());
    }
}
