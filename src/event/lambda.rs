//! Lambda-style proxy event conversion.
//!
//! The event and result shapes mirror the API-gateway proxy integration
//! contract: single-value and multi-value header/query maps may both be
//! present on the way in (multi-value wins on overlap, since it is the
//! superset), and both are always emitted on the way out so that targets
//! consuming either shape see consistent data.

use std::collections::HashMap;

use base64::Engine as _;
use http::Method;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::ids::RequestId;

use super::normalized::{normalize_path, Body, Headers, NormalizedRequest, NormalizedResponse, QueryParams};

/// Inbound Lambda-style proxy event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LambdaEvent {
    pub http_method: String,
    pub path: String,
    pub headers: Option<HashMap<String, String>>,
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub multi_value_query_string_parameters: Option<HashMap<String, Vec<String>>>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
    pub request_context: Option<LambdaRequestContext>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LambdaRequestContext {
    pub request_id: Option<String>,
    pub identity: Option<LambdaIdentity>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LambdaIdentity {
    pub source_ip: Option<String>,
}

/// Outbound Lambda-style proxy result.
///
/// `headers` carries the last value per name for targets that only read the
/// single-value map; `multi_value_headers` carries every value. Gateways that
/// understand both merge them into a single list.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LambdaResult {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub multi_value_headers: HashMap<String, Vec<String>>,
    pub body: String,
    pub is_base64_encoded: bool,
}

/// Convert an inbound Lambda event to the canonical request shape.
///
/// Missing headers and query maps are treated as absent, never an error; the
/// only failure is a body that claims base64 encoding it does not satisfy.
pub fn lambda_event_to_normalized(event: &LambdaEvent) -> Result<NormalizedRequest, GatewayError> {
    let method = event
        .http_method
        .parse::<Method>()
        .map_err(|_| GatewayError::BodyDecode(format!("unknown method {:?}", event.http_method)))?;

    let mut headers = Headers::new();
    if let Some(single) = &event.headers {
        for (name, value) in single {
            headers.append(name, value.clone());
        }
    }
    if let Some(multi) = &event.multi_value_headers {
        for (name, values) in multi {
            // multi-value is the superset; replace any single-value entry
            if !values.is_empty() {
                headers.set(name, values[0].clone());
                for value in &values[1..] {
                    headers.append(name, value.clone());
                }
            }
        }
    }

    let mut query_params = QueryParams::new();
    if let Some(single) = &event.query_string_parameters {
        for (name, value) in single {
            query_params.append(name, value.clone());
        }
    }
    if let Some(multi) = &event.multi_value_query_string_parameters {
        let mut folded = QueryParams::new();
        for (name, values) in multi {
            for value in values {
                folded.append(name, value.clone());
            }
        }
        // as with headers, the multi-value map wins when both are present
        if !folded.is_empty() {
            query_params = folded;
        }
    }

    let body = match &event.body {
        None => None,
        Some(raw) if event.is_base64_encoded => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(raw)
                .map_err(|e| GatewayError::BodyDecode(e.to_string()))?;
            Some(Body::Binary(bytes))
        }
        Some(raw) => Some(Body::Text(raw.clone())),
    };

    let source_ip = event
        .request_context
        .as_ref()
        .and_then(|ctx| ctx.identity.as_ref())
        .and_then(|id| id.source_ip.clone());

    let id = RequestId::from_header_or_new(headers.get("x-request-id"));

    Ok(NormalizedRequest {
        id,
        method,
        path: normalize_path(&event.path),
        headers,
        query_params,
        body,
        source_ip,
    })
}

/// Convert a canonical response to the outbound Lambda result shape.
///
/// A single-valued header still yields a one-element sequence in
/// `multi_value_headers`, preserving uniform handling on the receiving side.
#[must_use]
pub fn lambda_result_from_normalized(response: &NormalizedResponse) -> LambdaResult {
    let mut headers = HashMap::new();
    let mut multi_value_headers = HashMap::new();
    for (name, values) in response.headers.iter() {
        if let Some(last) = values.last() {
            headers.insert(name.to_string(), last.clone());
        }
        multi_value_headers.insert(name.to_string(), values.to_vec());
    }

    let (body, is_base64_encoded) = match &response.body {
        None => (String::new(), false),
        Some(Body::Text(text)) => (text.clone(), false),
        Some(Body::Binary(bytes)) => (
            base64::engine::general_purpose::STANDARD.encode(bytes),
            true,
        ),
    };

    LambdaResult {
        status_code: if response.status == 0 { 200 } else { response.status },
        headers,
        multi_value_headers,
        body,
        is_base64_encoded,
    }
}

/// Convert a handler's Lambda result back to the canonical response shape.
///
/// Single-value and multi-value header maps merge, multi-value winning on
/// overlap. A missing status defaults to 200; a base64 body that fails to
/// decode surfaces as a decode error rather than passing garbage downstream.
pub fn lambda_result_to_normalized(result: &LambdaResult) -> Result<NormalizedResponse, GatewayError> {
    let mut headers = Headers::new();
    for (name, value) in &result.headers {
        headers.set(name, value.clone());
    }
    for (name, values) in &result.multi_value_headers {
        if let Some((first, rest)) = values.split_first() {
            headers.set(name, first.clone());
            for value in rest {
                headers.append(name, value.clone());
            }
        }
    }

    let body = if result.body.is_empty() {
        None
    } else if result.is_base64_encoded {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&result.body)
            .map_err(|e| GatewayError::BodyDecode(e.to_string()))?;
        Some(Body::Binary(bytes))
    } else {
        Some(Body::Text(result.body.clone()))
    };

    Ok(NormalizedResponse {
        status: if result.status_code == 0 { 200 } else { result.status_code },
        headers,
        body,
    })
}

/// Build the Lambda event a handler receives from a canonical request.
pub fn lambda_event_from_normalized(request: &NormalizedRequest) -> LambdaEvent {
    let mut headers = HashMap::new();
    let mut multi_value_headers = HashMap::new();
    for (name, values) in request.headers.iter() {
        if let Some(last) = values.last() {
            headers.insert(name.to_string(), last.clone());
        }
        multi_value_headers.insert(name.to_string(), values.to_vec());
    }

    let mut query = HashMap::new();
    let mut multi_query = HashMap::new();
    for (name, values) in request.query_params.iter() {
        if let Some(last) = values.last() {
            query.insert(name.to_string(), last.clone());
        }
        multi_query.insert(name.to_string(), values.to_vec());
    }

    let (body, is_base64_encoded) = match &request.body {
        None => (None, false),
        Some(Body::Text(text)) => (Some(text.clone()), false),
        Some(Body::Binary(bytes)) => (
            Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            true,
        ),
    };

    LambdaEvent {
        http_method: request.method.to_string(),
        path: request.path.clone(),
        headers: Some(headers),
        multi_value_headers: Some(multi_value_headers),
        query_string_parameters: Some(query),
        multi_value_query_string_parameters: Some(multi_query),
        body,
        is_base64_encoded,
        request_context: Some(LambdaRequestContext {
            request_id: Some(request.id.to_string()),
            identity: request.source_ip.clone().map(|source_ip| LambdaIdentity {
                source_ip: Some(source_ip),
            }),
        }),
    }
}
