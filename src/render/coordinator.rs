use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use may::coroutine;
use tracing::{debug, error, info, warn};

use crate::error::GatewayError;
use crate::event::{FetchBody, FetchRequest, FetchResponse};
use crate::middleware::{invoke, AuthState, MiddlewareResponse, MiddlewareRouter};
use crate::runtime_config::ExecutionMode;
use crate::stream::{self, ChunkSender};

use super::bot::is_crawler;
use super::entries::{EntryCache, PageRenderer, RenderInput, RouteHooks};
use super::manifest::RouteManifest;

pub struct RenderCoordinatorConfig {
    pub mode: ExecutionMode,
    /// Stack size for renderer coroutines.
    pub stack_size: usize,
}

/// Drives the page-route pipeline end to end.
pub struct RenderCoordinator {
    manifest: RouteManifest,
    middleware: MiddlewareRouter,
    entries: EntryCache,
    route_hooks: HashMap<String, Arc<dyn RouteHooks>>,
    config: RenderCoordinatorConfig,
}

impl RenderCoordinator {
    pub fn new(
        manifest: RouteManifest,
        middleware: MiddlewareRouter,
        entries: EntryCache,
        route_hooks: HashMap<String, Arc<dyn RouteHooks>>,
        config: RenderCoordinatorConfig,
    ) -> Self {
        Self {
            manifest,
            middleware,
            entries,
            route_hooks,
            config,
        }
    }

    /// Serve one page request.
    ///
    /// Middleware errors propagate out of here; the server layer turns them
    /// into a 500. Render errors do not: they become the fallback document.
    pub fn handle(&self, request: &FetchRequest) -> Result<FetchResponse, GatewayError> {
        let path = request.url.path().to_string();

        // MATCH_ROUTE: fail fast before any middleware runs
        let Some((route, params)) = self.manifest.matching(&path) else {
            debug!(path = %path, "No page route matched");
            return Err(GatewayError::RouteNotFound { route: path });
        };
        let route = route.clone();

        // RUN_MIDDLEWARE
        let mut auth = AuthState::default();
        if let Some(matched) = self.middleware.matching(&request.method, &path) {
            let (response, chain_auth) = invoke(&matched.chain, request)?;
            auth = chain_auth;
            if response.short_circuits() {
                return Ok(middleware_terminal(response));
            }
        }

        // manifest redirects never render
        if let Some(target) = &route.redirect {
            info!(path = %path, target = %target, "Manifest redirect");
            return Ok(FetchResponse::redirect(302, target));
        }

        // LOAD_ENTRY_MODULES: once in production, per request in development
        let (renderer, fallback) = self.entries.get()?;

        // RUN_ROUTE_HOOKS + STREAM_RENDER failures both fall back
        let input = match self.render_input(request, &route, params, auth) {
            Ok(input) => input,
            Err(e) => return Ok(self.fallback_response(&fallback, &e)),
        };

        let user_agent = request.headers.get("user-agent");
        if is_crawler(user_agent) {
            debug!(user_agent = ?user_agent, "Crawler request, buffering render");
            return Ok(self.render_buffered(renderer, input, &fallback));
        }
        self.render_streaming(renderer, input, fallback)
    }

    fn render_input(
        &self,
        request: &FetchRequest,
        route: &super::manifest::RouteManifestItem,
        params: HashMap<String, String>,
        auth: AuthState,
    ) -> Result<RenderInput, GatewayError> {
        let meta = match route
            .route_hooks_ref
            .as_ref()
            .and_then(|r| self.route_hooks.get(r))
        {
            Some(hooks) => hooks.meta(request, &params)?,
            None => Vec::new(),
        };

        let mut bundle_refs = Vec::new();
        if let Some(client_entry) = self.entries.client_entry_ref() {
            bundle_refs.push(client_entry);
        }
        if let Some(bundle) = &route.bundle_ref {
            bundle_refs.push(bundle.clone());
        }

        Ok(RenderInput {
            request: request.clone(),
            route: route.clone(),
            params,
            auth,
            meta,
            bundle_refs,
            css_links: route.css_links.clone(),
        })
    }

    /// Crawler path: the whole document settles before anything is sent, so
    /// bots never index a partial page.
    fn render_buffered(
        &self,
        renderer: Arc<dyn PageRenderer>,
        input: RenderInput,
        fallback: &str,
    ) -> FetchResponse {
        let (tx, rx) = stream::channel();
        let outcome = catch_unwind(AssertUnwindSafe(|| renderer.render(input, tx)));
        match outcome {
            Ok(Ok(())) => FetchResponse::html(200, rx.collect()),
            Ok(Err(e)) => self.fallback_response(fallback, &e),
            Err(panic) => {
                self.fallback_response(fallback, &GatewayError::Render(format!("{panic:?}")))
            }
        }
    }

    /// Everyone else streams: the renderer runs in its own coroutine and the
    /// response body drains the channel as chunks arrive.
    fn render_streaming(
        &self,
        renderer: Arc<dyn PageRenderer>,
        input: RenderInput,
        fallback: String,
    ) -> Result<FetchResponse, GatewayError> {
        let (tx, rx) = stream::channel();
        let mode = self.config.mode;
        let request_id = input.request.headers.get("x-request-id").map(str::to_string);

        let builder = coroutine::Builder::new().stack_size(self.config.stack_size);
        // SAFETY: spawn is unsafe per the may runtime's contract. The closure
        // owns everything it touches (Arc renderer, cloned input, the sender
        // half of the stream), so no stack references escape this frame.
        let spawned = unsafe {
            builder.spawn(move || {
                let outcome =
                    catch_unwind(AssertUnwindSafe(|| renderer.render(input, tx.clone())));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => stream_fallback(&tx, &fallback, &e, mode, request_id.as_deref()),
                    Err(panic) => stream_fallback(
                        &tx,
                        &fallback,
                        &GatewayError::Render(format!("{panic:?}")),
                        mode,
                        request_id.as_deref(),
                    ),
                }
            })
        };
        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn renderer coroutine");
            return Err(GatewayError::Render(e.to_string()));
        }

        let mut response = FetchResponse::new(200);
        response
            .headers
            .set("content-type", "text/html; charset=utf-8");
        response.body = FetchBody::Stream(rx);
        Ok(response)
    }

    fn fallback_response(&self, fallback: &str, err: &GatewayError) -> FetchResponse {
        warn!(error = %err, "Render failed, serving fallback document");
        FetchResponse::html(200, enrich_fallback(fallback, err, self.config.mode))
    }
}

fn middleware_terminal(response: MiddlewareResponse) -> FetchResponse {
    let body = match response.body {
        Some(body) => FetchBody::Bytes(body.as_bytes().to_vec()),
        None => FetchBody::Empty,
    };
    FetchResponse {
        status: response.status,
        headers: response.headers,
        body,
    }
}

/// In development the fallback carries the error inline for the person
/// staring at the browser; production ships the document untouched.
fn enrich_fallback(fallback: &str, err: &GatewayError, mode: ExecutionMode) -> Vec<u8> {
    if mode.is_development() {
        format!(
            "{fallback}\n<!-- render error: {} -->",
            crate::dispatcher::escape_html(&err.to_string())
        )
        .into_bytes()
    } else {
        fallback.as_bytes().to_vec()
    }
}

fn stream_fallback(
    tx: &ChunkSender,
    fallback: &str,
    err: &GatewayError,
    mode: ExecutionMode,
    request_id: Option<&str>,
) {
    warn!(request_id = ?request_id, error = %err, "Streaming render failed, sending fallback document");
    tx.send(enrich_fallback(fallback, err, mode));
}
