mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::test_runtime::setup_may_runtime;
use common::tracing_util::TestTracing;
use fngate::event::{FetchBody, FetchRequest};
use fngate::middleware::{
    AuthState, Middleware, MiddlewareResponse, MiddlewareRouter,
};
use fngate::render::{
    EntryCache, EntryLoader, PageRenderer, RenderCoordinator, RenderCoordinatorConfig,
    RenderInput, RouteHooks, RouteManifest, RouteManifestItem,
};
use fngate::stream::ChunkSender;
use fngate::{ExecutionMode, GatewayError};
use http::Method;
use serde_json::{json, Value};

const CRAWLER_UA: &str = "Googlebot/2.1 (+http://www.google.com/bot.html)";
const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/130.0";

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

struct ChunkingRenderer;

impl PageRenderer for ChunkingRenderer {
    fn render(&self, input: RenderInput, tx: ChunkSender) -> Result<(), GatewayError> {
        tx.send(b"<html><head>".to_vec());
        for meta in &input.meta {
            tx.send(format!("<meta data-tag='{meta}'>").into_bytes());
        }
        tx.send(b"</head><body>page</body></html>".to_vec());
        Ok(())
    }
}

struct PanickingRenderer;

impl PageRenderer for PanickingRenderer {
    fn render(&self, _input: RenderInput, _tx: ChunkSender) -> Result<(), GatewayError> {
        panic!("template blew up")
    }
}

struct Loader {
    renderer: Arc<dyn PageRenderer>,
}

impl EntryLoader for Loader {
    fn load(&self) -> Result<(Arc<dyn PageRenderer>, String), GatewayError> {
        Ok((
            self.renderer.clone(),
            "<html><body>Something went wrong</body></html>".to_string(),
        ))
    }

    fn client_entry_ref(&self) -> Option<String> {
        Some("assets/entry.client.js".to_string())
    }
}

fn coordinator(
    manifest: RouteManifest,
    middleware: MiddlewareRouter,
    renderer: Arc<dyn PageRenderer>,
    route_hooks: HashMap<String, Arc<dyn RouteHooks>>,
    mode: ExecutionMode,
) -> RenderCoordinator {
    RenderCoordinator::new(
        manifest,
        middleware,
        EntryCache::new(Arc::new(Loader { renderer }), mode),
        route_hooks,
        RenderCoordinatorConfig {
            mode,
            stack_size: 0x8000,
        },
    )
}

fn get(url: &str, user_agent: &str) -> FetchRequest {
    let mut request = FetchRequest::parse(Method::GET, url).unwrap();
    request.headers.set("user-agent", user_agent);
    request
}

#[test]
fn test_unmatched_path_fails_before_middleware() {
    let _tracing = TestTracing::init();
    struct MustNotRun;
    impl Middleware for MustNotRun {
        fn name(&self) -> &str {
            "must_not_run"
        }
        fn process(
            &self,
            _request: &FetchRequest,
            _response: &mut MiddlewareResponse,
            _auth: &mut AuthState,
        ) -> Result<(), GatewayError> {
            panic!("middleware ran for an unmatched route");
        }
    }

    let mut middleware = MiddlewareRouter::new();
    middleware.register(Method::GET, "/*", vec![Arc::new(MustNotRun)]);
    let c = coordinator(
        RouteManifest::new(vec![item("/about")]),
        middleware,
        Arc::new(ChunkingRenderer),
        HashMap::new(),
        ExecutionMode::Production,
    );

    let err = c
        .handle(&get("http://localhost:8910/nope", BROWSER_UA))
        .unwrap_err();
    assert!(matches!(err, GatewayError::RouteNotFound { .. }));
    assert_eq!(err.status(), 404);
}

#[test]
fn test_middleware_redirect_is_terminal() {
    let _tracing = TestTracing::init();
    struct LoginGate;
    impl Middleware for LoginGate {
        fn name(&self) -> &str {
            "login_gate"
        }
        fn process(
            &self,
            _request: &FetchRequest,
            response: &mut MiddlewareResponse,
            _auth: &mut AuthState,
        ) -> Result<(), GatewayError> {
            response.redirect(302, "/login");
            Ok(())
        }
    }

    let mut middleware = MiddlewareRouter::new();
    middleware.register(Method::GET, "/dashboard", vec![Arc::new(LoginGate)]);
    let c = coordinator(
        RouteManifest::new(vec![item("/dashboard")]),
        middleware,
        Arc::new(PanickingRenderer), // must never be reached
        HashMap::new(),
        ExecutionMode::Production,
    );

    let response = c
        .handle(&get("http://localhost:8910/dashboard", BROWSER_UA))
        .unwrap();
    assert_eq!(response.status, 302);
    assert_eq!(response.headers.get("location"), Some("/login"));
}

#[test]
fn test_manifest_redirect_never_renders() {
    let _tracing = TestTracing::init();
    let mut route = item("/old-blog");
    route.redirect = Some("/blog".to_string());
    let c = coordinator(
        RouteManifest::new(vec![route]),
        MiddlewareRouter::new(),
        Arc::new(PanickingRenderer),
        HashMap::new(),
        ExecutionMode::Production,
    );

    let response = c
        .handle(&get("http://localhost:8910/old-blog", BROWSER_UA))
        .unwrap();
    assert!(response.is_redirect());
    assert_eq!(response.headers.get("location"), Some("/blog"));
}

#[test]
fn test_crawler_gets_fully_buffered_document() {
    let _tracing = TestTracing::init();
    let c = coordinator(
        RouteManifest::new(vec![item("/about")]),
        MiddlewareRouter::new(),
        Arc::new(ChunkingRenderer),
        HashMap::new(),
        ExecutionMode::Production,
    );

    let response = c
        .handle(&get("http://localhost:8910/about", CRAWLER_UA))
        .unwrap();
    assert_eq!(response.status, 200);
    match response.body {
        FetchBody::Bytes(bytes) => {
            let html = String::from_utf8(bytes).unwrap();
            assert!(html.starts_with("<html>"));
            assert!(html.ends_with("</html>"));
        }
        other => panic!("crawler response should be buffered, got {other:?}"),
    }
}

#[test]
fn test_browser_gets_streaming_body() {
    let _tracing = TestTracing::init();
    setup_may_runtime();
    let c = coordinator(
        RouteManifest::new(vec![item("/about")]),
        MiddlewareRouter::new(),
        Arc::new(ChunkingRenderer),
        HashMap::new(),
        ExecutionMode::Production,
    );

    let response = c
        .handle(&get("http://localhost:8910/about", BROWSER_UA))
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(
        response.headers.get("content-type"),
        Some("text/html; charset=utf-8")
    );
    match response.body {
        FetchBody::Stream(rx) => {
            let html = String::from_utf8(rx.collect()).unwrap();
            assert!(html.contains("<body>page</body>"));
        }
        other => panic!("browser response should stream, got {other:?}"),
    }
}

#[test]
fn test_render_panic_serves_fallback_not_error_page() {
    let _tracing = TestTracing::init();
    let c = coordinator(
        RouteManifest::new(vec![item("/about")]),
        MiddlewareRouter::new(),
        Arc::new(PanickingRenderer),
        HashMap::new(),
        ExecutionMode::Production,
    );

    let response = c
        .handle(&get("http://localhost:8910/about", CRAWLER_UA))
        .unwrap();
    assert_eq!(response.status, 200);
    let html = String::from_utf8(response.body.into_bytes()).unwrap();
    assert_eq!(html, "<html><body>Something went wrong</body></html>");
}

#[test]
fn test_development_fallback_carries_error_comment() {
    let _tracing = TestTracing::init();
    struct FailingRenderer;
    impl PageRenderer for FailingRenderer {
        fn render(&self, _input: RenderInput, _tx: ChunkSender) -> Result<(), GatewayError> {
            Err(GatewayError::Render("missing <Layout> component".into()))
        }
    }

    let c = coordinator(
        RouteManifest::new(vec![item("/about")]),
        MiddlewareRouter::new(),
        Arc::new(FailingRenderer),
        HashMap::new(),
        ExecutionMode::Development,
    );

    let response = c
        .handle(&get("http://localhost:8910/about", CRAWLER_UA))
        .unwrap();
    let html = String::from_utf8(response.body.into_bytes()).unwrap();
    assert!(html.starts_with("<html><body>Something went wrong</body></html>"));
    assert!(html.contains("<!-- render error:"));
    // untrusted error text is escaped before embedding
    assert!(html.contains("missing &lt;Layout&gt; component"));
}

#[test]
fn test_streaming_render_failure_sends_fallback_chunk() {
    let _tracing = TestTracing::init();
    setup_may_runtime();
    let c = coordinator(
        RouteManifest::new(vec![item("/about")]),
        MiddlewareRouter::new(),
        Arc::new(PanickingRenderer),
        HashMap::new(),
        ExecutionMode::Production,
    );

    let response = c
        .handle(&get("http://localhost:8910/about", BROWSER_UA))
        .unwrap();
    match response.body {
        FetchBody::Stream(rx) => {
            let html = String::from_utf8(rx.collect()).unwrap();
            assert_eq!(html, "<html><body>Something went wrong</body></html>");
        }
        other => panic!("expected a stream, got {other:?}"),
    }
}

#[test]
fn test_route_hooks_meta_reaches_renderer() {
    let _tracing = TestTracing::init();
    struct PostHooks {
        calls: AtomicUsize,
    }
    impl RouteHooks for PostHooks {
        fn meta(
            &self,
            _request: &FetchRequest,
            params: &HashMap<String, String>,
        ) -> Result<Vec<Value>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![json!({"title": format!("Post {}", params["id"])})])
        }
    }

    let hooks = Arc::new(PostHooks {
        calls: AtomicUsize::new(0),
    });
    let mut route = item("/posts/:id");
    route.route_hooks_ref = Some("posts".to_string());
    let c = coordinator(
        RouteManifest::new(vec![route]),
        MiddlewareRouter::new(),
        Arc::new(ChunkingRenderer),
        HashMap::from([("posts".to_string(), hooks.clone() as Arc<dyn RouteHooks>)]),
        ExecutionMode::Production,
    );

    let response = c
        .handle(&get("http://localhost:8910/posts/42", CRAWLER_UA))
        .unwrap();
    let html = String::from_utf8(response.body.into_bytes()).unwrap();
    assert!(html.contains("Post 42"));
    assert_eq!(hooks.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_hooks_failure_falls_back_instead_of_erroring() {
    let _tracing = TestTracing::init();
    struct BrokenHooks;
    impl RouteHooks for BrokenHooks {
        fn meta(
            &self,
            _request: &FetchRequest,
            _params: &HashMap<String, String>,
        ) -> Result<Vec<Value>, GatewayError> {
            Err(GatewayError::Render("hook db query failed".into()))
        }
    }

    let mut route = item("/posts/:id");
    route.route_hooks_ref = Some("posts".to_string());
    let c = coordinator(
        RouteManifest::new(vec![route]),
        MiddlewareRouter::new(),
        Arc::new(ChunkingRenderer),
        HashMap::from([(
            "posts".to_string(),
            Arc::new(BrokenHooks) as Arc<dyn RouteHooks>,
        )]),
        ExecutionMode::Production,
    );

    let response = c
        .handle(&get("http://localhost:8910/posts/1", CRAWLER_UA))
        .unwrap();
    assert_eq!(response.status, 200);
    let html = String::from_utf8(response.body.into_bytes()).unwrap();
    assert_eq!(html, "<html><body>Something went wrong</body></html>");
}
