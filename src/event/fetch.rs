//! Fetch-style request and response types.
//!
//! The streaming render coordinator works in terms of a method + URL request
//! and a response whose body may be a live chunk stream. These types are the
//! boundary between the coordinator and the rest of the gateway.

use http::Method;
use url::Url;

use crate::error::GatewayError;
use crate::stream::ChunkReceiver;

use super::normalized::{Body, Headers, NormalizedRequest, NormalizedResponse, QueryParams};

/// A Fetch-style request: method, absolute URL, headers, byte body.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl FetchRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Parse from a method and URL string.
    pub fn parse(method: Method, url: &str) -> Result<Self, GatewayError> {
        let url = Url::parse(url).map_err(|e| GatewayError::BodyDecode(e.to_string()))?;
        Ok(Self::new(method, url))
    }

    /// Convert to the canonical request shape. The URL's query string folds
    /// into ordered multi-value parameters.
    #[must_use]
    pub fn to_normalized(&self) -> NormalizedRequest {
        let mut request = NormalizedRequest::new(self.method.clone(), self.url.path());
        request.headers = self.headers.clone();
        request.query_params = self
            .url
            .query()
            .map(QueryParams::parse)
            .unwrap_or_default();
        request.body = self.body.as_ref().map(|bytes| {
            match String::from_utf8(bytes.clone()) {
                Ok(text) => Body::Text(text),
                Err(e) => Body::Binary(e.into_bytes()),
            }
        });
        request
    }

    /// Build from a canonical request and the origin it arrived on.
    pub fn from_normalized(request: &NormalizedRequest, origin: &str) -> Result<Self, GatewayError> {
        let mut url = Url::parse(origin)
            .and_then(|base| base.join(&request.path))
            .map_err(|e| GatewayError::BodyDecode(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, values) in request.query_params.iter() {
                for value in values {
                    pairs.append_pair(name, value);
                }
            }
        }
        Ok(Self {
            method: request.method.clone(),
            url,
            headers: request.headers.clone(),
            body: request.body.as_ref().map(|b| b.as_bytes().to_vec()),
        })
    }
}

/// Body of a Fetch-style response.
pub enum FetchBody {
    Empty,
    Bytes(Vec<u8>),
    /// Chunks arrive as the renderer produces them.
    Stream(ChunkReceiver),
}

impl FetchBody {
    /// Drain into a single buffer, blocking on a stream until it closes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FetchBody::Empty => Vec::new(),
            FetchBody::Bytes(bytes) => bytes,
            FetchBody::Stream(rx) => rx.collect(),
        }
    }
}

impl std::fmt::Debug for FetchBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchBody::Empty => write!(f, "FetchBody::Empty"),
            FetchBody::Bytes(bytes) => write!(f, "FetchBody::Bytes({} bytes)", bytes.len()),
            FetchBody::Stream(_) => write!(f, "FetchBody::Stream"),
        }
    }
}

/// A Fetch-style response with a possibly-streaming body.
#[derive(Debug)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: FetchBody,
}

impl FetchResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: FetchBody::Empty,
        }
    }

    /// HTML response with a fully-buffered body.
    #[must_use]
    pub fn html(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let mut headers = Headers::new();
        headers.set("content-type", "text/html; charset=utf-8");
        Self {
            status,
            headers,
            body: FetchBody::Bytes(body.into()),
        }
    }

    /// Redirect response with a `Location` header and no body.
    #[must_use]
    pub fn redirect(status: u16, location: &str) -> Self {
        let mut headers = Headers::new();
        headers.set("location", location);
        Self {
            status,
            headers,
            body: FetchBody::Empty,
        }
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.headers.contains("location")
    }

    /// Collapse to the canonical response shape, buffering any stream.
    #[must_use]
    pub fn into_normalized(self) -> NormalizedResponse {
        let mut response = NormalizedResponse::new(self.status);
        response.headers = self.headers;
        let bytes = self.body.into_bytes();
        if !bytes.is_empty() {
            response.body = Some(match String::from_utf8(bytes) {
                Ok(text) => Body::Text(text),
                Err(e) => Body::Binary(e.into_bytes()),
            });
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream;

    #[test]
    fn test_to_normalized_folds_query() {
        let req = FetchRequest::parse(Method::GET, "http://localhost:8910/about?a=1&a=2").unwrap();
        let norm = req.to_normalized();
        assert_eq!(norm.path, "/about");
        assert_eq!(norm.query_params.get_all("a"), &["1", "2"]);
    }

    #[test]
    fn test_from_normalized_rebuilds_url() {
        let mut norm = NormalizedRequest::new(Method::GET, "/posts");
        norm.query_params.append("page", "2");
        let req = FetchRequest::from_normalized(&norm, "http://localhost:8910").unwrap();
        assert_eq!(req.url.as_str(), "http://localhost:8910/posts?page=2");
    }

    #[test]
    fn test_stream_body_buffers_into_normalized() {
        let (tx, rx) = stream::channel();
        tx.send(b"<p>hi".to_vec());
        tx.send(b"</p>".to_vec());
        drop(tx);
        let res = FetchResponse {
            status: 200,
            headers: Headers::new(),
            body: FetchBody::Stream(rx),
        };
        let norm = res.into_normalized();
        assert_eq!(norm.body.unwrap().as_bytes(), b"<p>hi</p>");
    }

    #[test]
    fn test_redirect_detection() {
        let res = FetchResponse::redirect(302, "/login");
        assert!(res.is_redirect());
        assert!(!FetchResponse::new(200).is_redirect());
    }
}
