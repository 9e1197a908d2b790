use std::collections::HashSet;

use http::Method;

use crate::event::Headers;

/// How the `access-control-allow-origin` header is resolved.
#[derive(Debug, Clone)]
pub enum CorsOrigin {
    /// Echo whatever `Origin` the request carried.
    Any,
    /// Always emit this origin.
    Fixed(String),
    /// Echo the request origin only when it is in the set.
    AllowedSet(HashSet<String>),
}

/// CORS policy for the GraphQL endpoint.
///
/// `apply` writes headers with replace semantics, so applying a policy twice
/// to the same response leaves it identical to applying it once.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    pub origin: CorsOrigin,
    pub allow_credentials: bool,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub max_age: Option<u32>,
}

impl CorsPolicy {
    #[must_use]
    pub fn new(origin: CorsOrigin) -> Self {
        Self {
            origin,
            allow_credentials: false,
            allowed_methods: vec![Method::GET, Method::POST, Method::OPTIONS],
            allowed_headers: vec!["content-type".into(), "authorization".into()],
            max_age: None,
        }
    }

    /// Resolve the origin value for a request, if the policy grants one.
    #[must_use]
    pub fn resolve_origin(&self, request_origin: Option<&str>) -> Option<String> {
        match &self.origin {
            CorsOrigin::Any => request_origin.map(str::to_string),
            CorsOrigin::Fixed(origin) => Some(origin.clone()),
            CorsOrigin::AllowedSet(set) => request_origin
                .filter(|origin| set.contains(*origin))
                .map(str::to_string),
        }
    }

    /// Write the policy's headers onto a response. Idempotent.
    pub fn apply(&self, request_origin: Option<&str>, headers: &mut Headers) {
        let Some(origin) = self.resolve_origin(request_origin) else {
            return;
        };
        headers.set("access-control-allow-origin", origin);
        if self.allow_credentials {
            headers.set("access-control-allow-credentials", "true");
        }
        headers.set(
            "access-control-allow-methods",
            self.allowed_methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
        headers.set("access-control-allow-headers", self.allowed_headers.join(", "));
        if let Some(max_age) = self.max_age {
            headers.set("access-control-max-age", max_age.to_string());
        }
        // echoed origins vary per request; tell caches so
        if matches!(self.origin, CorsOrigin::Any | CorsOrigin::AllowedSet(_)) {
            headers.set("vary", "origin");
        }
    }
}
