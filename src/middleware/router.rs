use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use super::core::Middleware;

type Chain = Arc<Vec<Arc<dyn Middleware>>>;

/// Node in the middleware pattern tree.
///
/// Segment classes live in separate child lists so search can apply the
/// static > param > wildcard priority without sorting.
#[derive(Default)]
struct PatternNode {
    /// Chains terminating at this node, per method, in registration order.
    terminals: HashMap<Method, Vec<Chain>>,
    children: Vec<(String, PatternNode)>,
    param_children: Vec<(String, PatternNode)>,
    /// `*` catch-all: consumes the remaining segments.
    wildcard: Option<Vec<(Method, Chain)>>,
}

impl PatternNode {
    fn insert(&mut self, segments: &[&str], method: Method, entry: Chain) {
        let Some((segment, remaining)) = segments.split_first() else {
            self.terminals.entry(method).or_default().push(entry);
            return;
        };

        if *segment == "*" {
            self.wildcard
                .get_or_insert_with(Vec::new)
                .push((method, entry));
            return;
        }

        if let Some(param) = segment.strip_prefix(':') {
            for (name, child) in &mut self.param_children {
                if name == param {
                    child.insert(remaining, method, entry);
                    return;
                }
            }
            let mut child = PatternNode::default();
            child.insert(remaining, method, entry);
            self.param_children.push((param.to_string(), child));
            return;
        }

        for (name, child) in &mut self.children {
            if name == segment {
                child.insert(remaining, method, entry);
                return;
            }
        }
        let mut child = PatternNode::default();
        child.insert(remaining, method, entry);
        self.children.push(((*segment).to_string(), child));
    }

    fn search(
        &self,
        segments: &[&str],
        method: &Method,
        params: &mut HashMap<String, String>,
    ) -> Option<Chain> {
        let Some((segment, remaining)) = segments.split_first() else {
            // first registered wins among terminals here
            return self
                .terminals
                .get(method)
                .and_then(|entries| entries.first())
                .cloned();
        };

        // static beats param beats wildcard, with backtracking
        for (name, child) in &self.children {
            if name == segment {
                if let Some(entry) = child.search(remaining, method, params) {
                    return Some(entry);
                }
            }
        }

        for (name, child) in &self.param_children {
            params.insert(name.clone(), (*segment).to_string());
            if let Some(entry) = child.search(remaining, method, params) {
                return Some(entry);
            }
            params.remove(name);
        }

        if let Some(entries) = &self.wildcard {
            if let Some((_, entry)) = entries.iter().find(|(m, _)| m == method) {
                params.insert("*".to_string(), segments.join("/"));
                return Some(entry.clone());
            }
        }

        None
    }
}

/// A matched middleware chain with its captured path parameters.
pub struct MiddlewareMatch {
    pub chain: Chain,
    pub params: HashMap<String, String>,
}

/// Pattern tree mapping `(method, pattern)` to middleware chains.
///
/// Registration order is significant: when two patterns of equal specificity
/// both match a path, the one registered first wins.
#[derive(Default)]
pub struct MiddlewareRouter {
    root: PatternNode,
}

impl MiddlewareRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chain under a pattern like `/posts/:id` or `/assets/*`.
    pub fn register(&mut self, method: Method, pattern: &str, chain: Vec<Arc<dyn Middleware>>) {
        let segments: Vec<&str> = pattern
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        self.root.insert(&segments, method, Arc::new(chain));
    }

    /// Match a request path, returning the winning chain and its captures.
    #[must_use]
    pub fn matching(&self, method: &Method, path: &str) -> Option<MiddlewareMatch> {
        let segments: Vec<&str> = path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let mut params = HashMap::new();
        let chain = self.root.search(&segments, method, &mut params)?;
        Some(MiddlewareMatch { chain, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::event::FetchRequest;
    use crate::middleware::{AuthState, MiddlewareResponse};

    struct Tagged(&'static str);
    impl Middleware for Tagged {
        fn name(&self) -> &str {
            self.0
        }
        fn process(
            &self,
            _request: &FetchRequest,
            response: &mut MiddlewareResponse,
            _auth: &mut AuthState,
        ) -> Result<(), GatewayError> {
            response.headers.append("x-tag", self.0);
            Ok(())
        }
    }

    fn chain(tag: &'static str) -> Vec<Arc<dyn Middleware>> {
        vec![Arc::new(Tagged(tag))]
    }

    fn tag_of(router: &MiddlewareRouter, method: Method, path: &str) -> Option<String> {
        router
            .matching(&method, path)
            .map(|m| m.chain[0].name().to_string())
    }

    #[test]
    fn test_static_beats_param_beats_wildcard() {
        let mut router = MiddlewareRouter::new();
        router.register(Method::GET, "/posts/*", chain("wild"));
        router.register(Method::GET, "/posts/:id", chain("param"));
        router.register(Method::GET, "/posts/new", chain("static"));

        assert_eq!(tag_of(&router, Method::GET, "/posts/new").as_deref(), Some("static"));
        assert_eq!(tag_of(&router, Method::GET, "/posts/42").as_deref(), Some("param"));
        assert_eq!(
            tag_of(&router, Method::GET, "/posts/a/b/c").as_deref(),
            Some("wild")
        );
    }

    #[test]
    fn test_param_capture() {
        let mut router = MiddlewareRouter::new();
        router.register(Method::GET, "/users/:id/posts/:post_id", chain("m"));
        let m = router.matching(&Method::GET, "/users/7/posts/99").unwrap();
        assert_eq!(m.params.get("id").map(String::as_str), Some("7"));
        assert_eq!(m.params.get("post_id").map(String::as_str), Some("99"));
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let mut router = MiddlewareRouter::new();
        router.register(Method::GET, "/a/:x", chain("first"));
        router.register(Method::GET, "/a/:y", chain("second"));
        assert_eq!(tag_of(&router, Method::GET, "/a/1").as_deref(), Some("first"));
    }

    #[test]
    fn test_backtracking_from_dead_end_param() {
        let mut router = MiddlewareRouter::new();
        // /files/:name only terminates at depth 2; /files/* covers deeper paths
        router.register(Method::GET, "/files/:name", chain("param"));
        router.register(Method::GET, "/files/*", chain("wild"));
        assert_eq!(
            tag_of(&router, Method::GET, "/files/a/b").as_deref(),
            Some("wild")
        );
    }

    #[test]
    fn test_method_is_part_of_the_key() {
        let mut router = MiddlewareRouter::new();
        router.register(Method::POST, "/submit", chain("post_only"));
        assert!(router.matching(&Method::GET, "/submit").is_none());
        assert!(router.matching(&Method::POST, "/submit").is_some());
    }
}
