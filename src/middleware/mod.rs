//! # Middleware Chain Router
//!
//! Matches `(method, path)` against registered middleware chains and runs
//! the winning chain in order.
//!
//! ## Matching
//!
//! Patterns are segment-based with `:name` captures and a trailing `*`
//! catch-all. At each depth, static segments beat `:param` segments, which
//! beat `*`; patterns that remain ambiguous after specificity resolve to
//! registration order. Matching backtracks, so a param branch that dead-ends
//! does not shadow a viable sibling.
//!
//! ## Invocation
//!
//! [`invoke`] runs the chain front to back against a shared response
//! accumulator. A middleware producing a redirect or a body-bearing response
//! short-circuits the rest of the chain; a chain that produces neither is a
//! pass-through and the coordinator continues to the render pipeline. A
//! middleware error or panic propagates to the caller as
//! [`GatewayError::MiddlewareCrash`](crate::error::GatewayError) - it is
//! never swallowed here.

mod core;
mod router;

pub use core::{invoke, AuthState, Middleware, MiddlewareResponse};
pub use router::{MiddlewareMatch, MiddlewareRouter};
