use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GatewayError;

/// One page route from the build-time manifest.
///
/// The manifest is written by the build and read-only at request time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteManifestItem {
    /// Pattern like `/posts/:id` or `/files/*`.
    pub path_definition: String,
    /// Requires an authenticated caller; forwarded to the renderer.
    #[serde(default)]
    pub is_private: bool,
    /// Redirect target; routes with one never render.
    #[serde(default)]
    pub redirect: Option<String>,
    /// Per-route JS bundle injected into the rendered document.
    #[serde(default)]
    pub bundle_ref: Option<String>,
    /// Key into the registered route-hooks table.
    #[serde(default)]
    pub route_hooks_ref: Option<String>,
    /// Stylesheets for this route.
    #[serde(default)]
    pub css_links: Vec<String>,
}

fn match_definition(definition: &str, path: &str) -> Option<HashMap<String, String>> {
    let def_segments: Vec<&str> = definition
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let path_segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let mut params = HashMap::new();
    let mut pi = 0;
    for def in &def_segments {
        if *def == "*" {
            params.insert("*".to_string(), path_segments[pi..].join("/"));
            return Some(params);
        }
        let Some(segment) = path_segments.get(pi) else {
            return None;
        };
        if let Some(name) = def.strip_prefix(':') {
            params.insert(name.to_string(), (*segment).to_string());
        } else if def != segment {
            return None;
        }
        pi += 1;
    }
    if pi == path_segments.len() {
        Some(params)
    } else {
        None
    }
}

/// Ordered page-route table loaded from the build manifest.
///
/// Items match in manifest order; the first definition that fits the path
/// wins, which is how the build serializes route precedence.
#[derive(Debug, Clone, Default)]
pub struct RouteManifest {
    items: Vec<RouteManifestItem>,
}

impl RouteManifest {
    #[must_use]
    pub fn new(items: Vec<RouteManifestItem>) -> Self {
        Self { items }
    }

    /// Load from the build's JSON manifest file.
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let raw = std::fs::read_to_string(path)?;
        let items: Vec<RouteManifestItem> =
            serde_json::from_str(&raw).map_err(|e| GatewayError::Render(e.to_string()))?;
        debug!(path = %path.display(), routes = items.len(), "Route manifest loaded");
        Ok(Self { items })
    }

    /// First item whose definition matches the path, with its captures.
    #[must_use]
    pub fn matching(&self, path: &str) -> Option<(&RouteManifestItem, HashMap<String, String>)> {
        self.items
            .iter()
            .find_map(|item| match_definition(&item.path_definition, path).map(|p| (item, p)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(def: &str) -> RouteManifestItem {
        RouteManifestItem {
            path_definition: def.to_string(),
            is_private: false,
            redirect: None,
            bundle_ref: None,
            route_hooks_ref: None,
            css_links: Vec::new(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let manifest = RouteManifest::new(vec![item("/posts/new"), item("/posts/:id")]);
        let (matched, params) = manifest.matching("/posts/new").unwrap();
        assert_eq!(matched.path_definition, "/posts/new");
        assert!(params.is_empty());

        let (matched, params) = manifest.matching("/posts/42").unwrap();
        assert_eq!(matched.path_definition, "/posts/:id");
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_splat_captures_remainder() {
        let manifest = RouteManifest::new(vec![item("/docs/*")]);
        let (_, params) = manifest.matching("/docs/guide/intro").unwrap();
        assert_eq!(params.get("*").map(String::as_str), Some("guide/intro"));
    }

    #[test]
    fn test_length_mismatch_is_no_match() {
        let manifest = RouteManifest::new(vec![item("/posts/:id")]);
        assert!(manifest.matching("/posts").is_none());
        assert!(manifest.matching("/posts/1/edit").is_none());
    }
}
