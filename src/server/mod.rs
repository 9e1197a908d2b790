//! # HTTP Server Module
//!
//! The transport boundary: accepts HTTP connections via `may_minihttp`,
//! normalizes requests, routes them to the dispatcher, the GraphQL handler,
//! or the render coordinator, and writes responses back.
//!
//! ## Routing Policy
//!
//! - `GET /health` - liveness probe, `{"status": "ok"}`
//! - paths under the function prefix (default `/fn`) - the function
//!   dispatcher; the `graphql` route name goes to the GraphQL handler when
//!   one is configured
//! - everything else - the streaming render coordinator's page pipeline
//!
//! One coroutine serves each connection; the service itself is cheap to
//! clone and shared state lives behind `Arc`.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::normalize_request;
pub use response::{write_fetch_response, write_json_error, write_normalized_response};
pub use service::GatewayService;
