//! # Dispatcher Module
//!
//! Resolves inbound requests to registered functions and contains their
//! failures.
//!
//! ## Overview
//!
//! The dispatcher sits between the transport boundary and the function
//! registry:
//!
//! 1. The route name is the final segment of the request path
//!    (`/fn/graphql` -> `graphql`), whatever prefix the deployment mounts
//!    functions under.
//! 2. The name resolves against the current registry snapshot.
//! 3. The normalized request converts to the handler's Lambda event shape,
//!    the handler runs, and its result converts back.
//!
//! ## Error Containment
//!
//! A handler panic or error is caught at the dispatch boundary, logged with
//! the request id, and becomes a 500 response. Nothing a handler does can
//! take down the process or affect a concurrent request.
//!
//! ## Not-Found Behavior
//!
//! A miss (or a registered-but-null handler) is a 404. In development the
//! body is a JSON object listing the available route names; in production it
//! is only the HTML-escaped `Function "<name>" was not found.` string, so
//! deployed error pages never enumerate routes.

mod core;

pub use core::{escape_html, Dispatcher};
