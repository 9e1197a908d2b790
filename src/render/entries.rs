use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use crate::error::GatewayError;
use crate::event::FetchRequest;
use crate::middleware::AuthState;
use crate::runtime_config::ExecutionMode;
use crate::stream::ChunkSender;

use super::manifest::RouteManifestItem;

/// Everything a renderer needs for one page.
#[derive(Clone)]
pub struct RenderInput {
    pub request: FetchRequest,
    pub route: RouteManifestItem,
    pub params: HashMap<String, String>,
    pub auth: AuthState,
    /// Meta tags produced by the route's hooks.
    pub meta: Vec<Value>,
    /// JS bundles to inject: client entry plus the route's own bundle.
    pub bundle_refs: Vec<String>,
    pub css_links: Vec<String>,
}

/// The external page renderer the coordinator drives.
///
/// `render` writes HTML chunks to the sender as they become ready and
/// returns once the document is complete. Writing after the client has gone
/// away is a no-op by the stream contract, so renderers need no disconnect
/// handling of their own.
pub trait PageRenderer: Send + Sync {
    fn render(&self, input: RenderInput, tx: ChunkSender) -> Result<(), GatewayError>;
}

/// Per-route server hooks, keyed by the manifest's `route_hooks_ref`.
pub trait RouteHooks: Send + Sync {
    /// Meta tags to inject for this request.
    fn meta(&self, request: &FetchRequest, params: &HashMap<String, String>)
        -> Result<Vec<Value>, GatewayError>;
}

/// Loads the entry modules: the server renderer and the static fallback
/// document served when rendering fails.
pub trait EntryLoader: Send + Sync {
    fn load(&self) -> Result<(Arc<dyn PageRenderer>, String), GatewayError>;
    /// Client entry bundle ref injected into every page.
    fn client_entry_ref(&self) -> Option<String> {
        None
    }
}

/// Entry modules with mode-dependent caching: loaded once in production,
/// freshly per request in development so edits show up without a restart.
pub struct EntryCache {
    loader: Arc<dyn EntryLoader>,
    mode: ExecutionMode,
    cached: OnceCell<(Arc<dyn PageRenderer>, String)>,
}

impl EntryCache {
    pub fn new(loader: Arc<dyn EntryLoader>, mode: ExecutionMode) -> Self {
        Self {
            loader,
            mode,
            cached: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Result<(Arc<dyn PageRenderer>, String), GatewayError> {
        if self.mode.is_development() {
            debug!("Loading entry modules (development, per request)");
            return self.loader.load();
        }
        self.cached
            .get_or_try_init(|| self.loader.load())
            .map(|(renderer, fallback)| (renderer.clone(), fallback.clone()))
    }

    #[must_use]
    pub fn client_entry_ref(&self) -> Option<String> {
        self.loader.client_entry_ref()
    }
}
