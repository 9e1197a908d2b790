//! # fngate
//!
//! **fngate** is a coroutine-powered serverless-function gateway: many
//! independently registered handler functions served behind one process, with
//! transport normalization, GraphQL execution, and streaming page rendering.
//!
//! ## Overview
//!
//! The gateway accepts Lambda-style proxy events, its own HTTP requests, and
//! Fetch-style requests, converts all of them into one canonical shape, and
//! routes them to either a registered function, the GraphQL endpoint, or the
//! page-rendering pipeline. The GraphQL engine and the page renderer are
//! external collaborators behind trait seams; this crate implements
//! everything around them.
//!
//! ## Architecture
//!
//! - **[`event`]** - transport normalization (Lambda events, server
//!   requests, Fetch requests) into [`event::NormalizedRequest`]
//! - **[`registry`]** - route-name to handler map with explicit plugin
//!   registration, bounded discovery, and hot rebuild-and-swap
//! - **[`dispatcher`]** - function lookup, invocation, and crash containment
//! - **[`graphql`]** - CORS, trusted operations, per-request scoping, and
//!   crash policy around the engine seam
//! - **[`middleware`]** - pattern-matched middleware chains for page routes
//! - **[`render`]** - the streaming render coordinator and its manifest,
//!   crawler detection, and entry caching
//! - **[`server`]** - the `may_minihttp` HTTP boundary
//! - **[`stream`]** - chunk channels with write-after-close no-op semantics
//!
//! ## Request Flow
//!
//! ```text
//! HTTP request
//!   -> normalize (event)
//!   -> /fn/* ? -> dispatcher -> function (graphql route -> graphql handler)
//!   -> page?  -> render coordinator
//!                  match manifest -> middleware -> hooks -> stream render
//! ```
//!
//! ## Concurrency Model
//!
//! One `may` coroutine per in-flight request; renderers run in their own
//! coroutines connected by chunk channels. Per-request state (identity,
//! request id) lives on the request's stack and is threaded explicitly
//! through calls - there is no global mutable request context anywhere in
//! the crate.

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod graphql;
pub mod ids;
pub mod middleware;
pub mod registry;
pub mod render;
pub mod runtime_config;
pub mod server;
pub mod stream;

pub use error::GatewayError;
pub use runtime_config::{ExecutionMode, RuntimeConfig};
