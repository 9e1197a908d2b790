use std::io::Read;

use http::Method;
use may_minihttp::Request;
use tracing::debug;

use crate::error::GatewayError;
use crate::event::{Body, Headers, NormalizedRequest, QueryParams};
use crate::ids::RequestId;

/// Convert a raw `may_minihttp` request into the canonical shape.
///
/// This is the second of the three transport normalizers (alongside the
/// Lambda event and Fetch converters). Repeated headers fold into ordered
/// sequences, the query string folds into multi-value parameters, and the
/// body is tagged text or binary by UTF-8 validity.
pub fn normalize_request(req: Request) -> Result<NormalizedRequest, GatewayError> {
    let method = req
        .method()
        .parse::<Method>()
        .map_err(|_| GatewayError::BodyDecode(format!("unknown method {:?}", req.method())))?;

    let raw_path = req.path().to_string();
    let (path, query) = match raw_path.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (raw_path, None),
    };

    let mut headers = Headers::new();
    for h in req.headers() {
        headers.append(h.name, String::from_utf8_lossy(h.value).to_string());
    }

    let query_params = query
        .as_deref()
        .map(QueryParams::parse)
        .unwrap_or_default();

    let mut raw_body = Vec::new();
    let body = match req.body().read_to_end(&mut raw_body) {
        Ok(0) => None,
        Ok(_) => Some(match String::from_utf8(raw_body) {
            Ok(text) => Body::Text(text),
            Err(e) => Body::Binary(e.into_bytes()),
        }),
        Err(e) => return Err(GatewayError::BodyDecode(e.to_string())),
    };

    let id = RequestId::from_header_or_new(headers.get("x-request-id"));
    debug!(
        request_id = %id,
        method = %method,
        path = %path,
        header_count = headers.len(),
        has_body = body.is_some(),
        "HTTP request normalized"
    );

    let mut request = NormalizedRequest::new(method, &path);
    request.id = id;
    request.headers = headers;
    request.query_params = query_params;
    request.body = body;
    Ok(request)
}
