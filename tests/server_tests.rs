mod common;

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use common::test_runtime::setup_may_runtime;
use common::tracing_util::TestTracing;
use fngate::dispatcher::Dispatcher;
use fngate::event::{LambdaEvent, LambdaResult};
use fngate::registry::{ExportShape, FunctionModule, FunctionRegistry};
use fngate::server::{GatewayService, HttpServer};
use fngate::{ExecutionMode, GatewayError};
use serde_json::json;

fn raw_get(addr: &str, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
    )
    .unwrap();
    let mut buf = Vec::new();
    // read whatever arrives before close or timeout
    let _ = stream.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn service() -> GatewayService {
    let registry = Arc::new(FunctionRegistry::new());
    registry.load(vec![FunctionModule::new(
        "ping",
        ExportShape::Handler(Arc::new(
            |_event: LambdaEvent| -> Result<LambdaResult, GatewayError> {
                Ok(LambdaResult {
                    status_code: 200,
                    body: json!({"pong": true}).to_string(),
                    ..Default::default()
                })
            },
        )),
    )]);
    GatewayService::new(Arc::new(Dispatcher::new(registry, ExecutionMode::Production)))
}

#[test]
fn test_health_and_function_dispatch_over_the_wire() {
    let _tracing = TestTracing::init();
    setup_may_runtime();

    let addr = "127.0.0.1:18913";
    let handle = HttpServer(service()).start(addr).unwrap();
    handle.wait_ready().unwrap();

    let health = raw_get(addr, "/health");
    assert!(health.starts_with("HTTP/1.1 200"), "got: {health}");
    assert!(health.contains("\"status\":\"ok\""));

    let pong = raw_get(addr, "/fn/ping");
    assert!(pong.starts_with("HTTP/1.1 200"), "got: {pong}");
    assert!(pong.contains("\"pong\":true"));

    let missing = raw_get(addr, "/fn/nope");
    assert!(missing.starts_with("HTTP/1.1 404"), "got: {missing}");

    handle.stop();
}
