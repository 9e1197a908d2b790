use http::Method;

use crate::ids::RequestId;

/// Case-insensitive, order-preserving, multi-value header map.
///
/// Keys are stored lower-cased (HTTP/2 compliant casing); values for a
/// repeated key keep their insertion order. This is the least common
/// denominator across the supported transports: single-value maps become
/// one-element sequences, so downstream code handles exactly one shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, creating the key if absent. De-duplicates the key by
    /// lower-casing; never de-duplicates values.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let key = name.to_ascii_lowercase();
        if let Some((_, values)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            values.push(value.into());
        } else {
            self.entries.push((key, vec![value.into()]));
        }
    }

    /// Replace all values for a key with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let key = name.to_ascii_lowercase();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, vec![value.into()]));
    }

    /// First value for a key (case-insensitive), if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// All values for a key, in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        let key = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let key = name.to_ascii_lowercase();
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Iterate `(name, values)` pairs in insertion order. Names are already
    /// lower-cased and unique.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}

/// Ordered multi-value query parameters.
///
/// `?a=1&a=2` folds into `a -> ["1", "2"]`, preserving the order the values
/// appeared on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a raw query string (everything after `?`).
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            params.append(&k, v.to_string());
        }
        params
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(k, _)| k == name) {
            values.push(value.into());
        } else {
            self.entries.push((name.to_string(), vec![value.into()]));
        }
    }

    /// First value for a key, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// All values for a key, in wire order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Request or response body, tagged with its encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// UTF-8 text, passed through transports unchanged.
    Text(String),
    /// Raw bytes; emitted base64-encoded on transports that require text.
    Binary(Vec<u8>),
}

impl Body {
    #[must_use]
    pub fn is_binary(&self) -> bool {
        matches!(self, Body::Binary(_))
    }

    /// Borrow the text form, if this is a text body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s.as_str()),
            Body::Binary(_) => None,
        }
    }

    /// Body content as raw bytes regardless of tag.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(s) => s.as_bytes(),
            Body::Binary(b) => b.as_slice(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Normalize a path: always leading slash, no trailing slash except root.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut p = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    while p.len() > 1 && p.ends_with('/') {
        p.pop();
    }
    p
}

/// The canonical, transport-independent request.
///
/// Created once per inbound transport event at the normalizer boundary and
/// consumed by the dispatcher or the GraphQL adapter. Immutable by
/// convention: transformations produce new instances, never mutate one that
/// has been handed downstream.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    /// Correlation id for this request's log lines
    pub id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Normalized path (leading slash, no trailing slash except root)
    pub path: String,
    /// Case-insensitive multi-value headers
    pub headers: Headers,
    /// Ordered multi-value query parameters
    pub query_params: QueryParams,
    /// Request body, if any
    pub body: Option<Body>,
    /// Client address, when the transport reports one
    pub source_ip: Option<String>,
}

impl NormalizedRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            id: RequestId::new(),
            method,
            path: normalize_path(path),
            headers: Headers::new(),
            query_params: QueryParams::new(),
            body: None,
            source_ip: None,
        }
    }

    /// Final path segment, used by the dispatcher as the route name.
    #[must_use]
    pub fn route_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }
}

/// The canonical, transport-independent response.
#[derive(Debug, Clone)]
pub struct NormalizedResponse {
    /// HTTP status code, 100..=599
    pub status: u16,
    /// Case-insensitive multi-value headers
    pub headers: Headers,
    /// Response body, if any
    pub body: Option<Body>,
}

impl NormalizedResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    /// JSON response with `content-type: application/json`.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        let mut headers = Headers::new();
        headers.set("content-type", "application/json");
        Self {
            status,
            headers,
            body: Some(Body::Text(body.to_string())),
        }
    }

    /// Plain-text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = Headers::new();
        headers.set("content-type", "text/plain");
        Self {
            status,
            headers,
            body: Some(Body::Text(body.into())),
        }
    }

    /// A redirect status combined with a `Location` header freezes the body:
    /// downstream stages must not attach one.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.headers.contains("location")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_case_insensitive() {
        let mut h = Headers::new();
        h.append("Content-Type", "application/json");
        assert_eq!(h.get("content-type"), Some("application/json"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(h.get("x-missing"), None);
    }

    #[test]
    fn test_headers_multi_value_order() {
        let mut h = Headers::new();
        h.append("Set-Cookie", "a=1");
        h.append("set-cookie", "b=2");
        assert_eq!(h.get_all("Set-Cookie"), &["a=1", "b=2"]);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_query_params_fold_repeated_keys() {
        let q = QueryParams::parse("a=1&b=x&a=2");
        assert_eq!(q.get_all("a"), &["1", "2"]);
        assert_eq!(q.get("b"), Some("x"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("graphql"), "/graphql");
        assert_eq!(normalize_path("/graphql/"), "/graphql");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_route_name_is_last_segment() {
        let req = NormalizedRequest::new(Method::GET, "/fn/nested/graphql");
        assert_eq!(req.route_name(), "graphql");
    }

    #[test]
    fn test_redirect_requires_location() {
        let mut res = NormalizedResponse::new(302);
        assert!(!res.is_redirect());
        res.headers.set("Location", "/login");
        assert!(res.is_redirect());
    }
}
