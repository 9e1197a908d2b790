mod common;

use std::collections::HashMap;

use base64::Engine as _;
use common::tracing_util::TestTracing;
use fngate::event::{
    lambda_event_from_normalized, lambda_event_to_normalized, lambda_result_from_normalized, Body,
    NormalizedResponse,
};
use fngate::event::LambdaEvent;

fn event(method: &str, path: &str) -> LambdaEvent {
    LambdaEvent {
        http_method: method.to_string(),
        path: path.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_multi_value_headers_survive_round_trip() {
    let _tracing = TestTracing::init();
    let mut inbound = event("GET", "/fn/posts");
    inbound.multi_value_headers = Some(HashMap::from([(
        "Set-Cookie".to_string(),
        vec!["a=1".to_string(), "b=2".to_string()],
    )]));

    let normalized = lambda_event_to_normalized(&inbound).unwrap();
    assert_eq!(normalized.headers.get_all("set-cookie"), &["a=1", "b=2"]);

    let emitted = lambda_event_from_normalized(&normalized);
    assert_eq!(
        emitted.multi_value_headers.unwrap().get("set-cookie"),
        Some(&vec!["a=1".to_string(), "b=2".to_string()])
    );
}

#[test]
fn test_repeated_query_keys_fold_and_re_emit() {
    let _tracing = TestTracing::init();
    // ?a=1&a=2 arriving as a multi-value map
    let mut inbound = event("GET", "/fn/search");
    inbound.multi_value_query_string_parameters = Some(HashMap::from([(
        "a".to_string(),
        vec!["1".to_string(), "2".to_string()],
    )]));

    let normalized = lambda_event_to_normalized(&inbound).unwrap();
    assert_eq!(normalized.query_params.get_all("a"), &["1", "2"]);

    let emitted = lambda_event_from_normalized(&normalized);
    assert_eq!(
        emitted
            .multi_value_query_string_parameters
            .unwrap()
            .get("a"),
        Some(&vec!["1".to_string(), "2".to_string()])
    );
}

#[test]
fn test_single_value_header_emits_one_element_sequence() {
    let mut response = NormalizedResponse::new(200);
    response.headers.set("content-type", "text/plain");
    let result = lambda_result_from_normalized(&response);
    assert_eq!(
        result.multi_value_headers.get("content-type"),
        Some(&vec!["text/plain".to_string()])
    );
    assert_eq!(
        result.headers.get("content-type"),
        Some(&"text/plain".to_string())
    );
}

#[test]
fn test_claimed_base64_that_is_not_fails_with_400() {
    let mut inbound = event("POST", "/fn/upload");
    inbound.body = Some("%%% not base64 %%%".to_string());
    inbound.is_base64_encoded = true;
    let err = lambda_event_to_normalized(&inbound).unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn test_binary_body_round_trips_through_base64() {
    let payload = vec![0u8, 159, 146, 150];
    let mut inbound = event("POST", "/fn/upload");
    inbound.body = Some(base64::engine::general_purpose::STANDARD.encode(&payload));
    inbound.is_base64_encoded = true;

    let normalized = lambda_event_to_normalized(&inbound).unwrap();
    assert_eq!(normalized.body, Some(Body::Binary(payload.clone())));

    let mut response = NormalizedResponse::new(200);
    response.body = Some(Body::Binary(payload.clone()));
    let result = lambda_result_from_normalized(&response);
    assert!(result.is_base64_encoded);
    assert_eq!(
        base64::engine::general_purpose::STANDARD
            .decode(&result.body)
            .unwrap(),
        payload
    );
}

#[test]
fn test_missing_header_is_absent_not_error() {
    let normalized = lambda_event_to_normalized(&event("GET", "/fn/x")).unwrap();
    assert_eq!(normalized.headers.get("authorization"), None);
    assert!(normalized.body.is_none());
}

#[test]
fn test_missing_status_defaults_to_200() {
    let mut response = NormalizedResponse::new(0);
    response.body = Some(Body::Text("ok".to_string()));
    let result = lambda_result_from_normalized(&response);
    assert_eq!(result.status_code, 200);
}
