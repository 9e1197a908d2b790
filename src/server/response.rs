use may_minihttp::Response;
use serde_json::Value;

use crate::event::{FetchResponse, NormalizedResponse};

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

fn write_headers(res: &mut Response, headers: &crate::event::Headers) {
    for (name, values) in headers.iter() {
        for value in values {
            // may_minihttp takes &'static str header lines; leak per write,
            // matching how dynamic content types are served elsewhere
            let line = format!("{name}: {value}").into_boxed_str();
            res.header(Box::leak(line));
        }
    }
}

/// Write a canonical response to the wire.
pub fn write_normalized_response(res: &mut Response, response: &NormalizedResponse) {
    res.status_code(response.status as usize, status_reason(response.status));
    write_headers(res, &response.headers);
    if let Some(body) = &response.body {
        res.body_vec(body.as_bytes().to_vec());
    }
}

/// Write a Fetch-style response, draining a streaming body.
///
/// `may_minihttp` responses are buffered, so a chunk stream is drained here;
/// incremental delivery applies to in-process consumers of [`FetchResponse`].
pub fn write_fetch_response(res: &mut Response, response: FetchResponse) {
    res.status_code(response.status as usize, status_reason(response.status));
    write_headers(res, &response.headers);
    let bytes = response.body.into_bytes();
    if !bytes.is_empty() {
        res.body_vec(bytes);
    }
}

/// JSON error body with the right status line.
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(204), "No Content");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(418), "OK");
    }
}
