//! # GraphQL Execution Adapter
//!
//! Wraps an external GraphQL engine behind the gateway's normalized request
//! interface.
//!
//! ## Overview
//!
//! The adapter owns everything around engine execution, not the engine
//! itself:
//!
//! - **CORS** - origin resolution (echo-any, fixed, allowed set), preflight
//!   short-circuit, idempotent header application
//! - **Trusted operations** - hash-identified persisted operations plus a
//!   small internal allowlist; arbitrary query text is rejected
//! - **Request scoping** - per-request [`RequestScope`] carrying the
//!   authenticated user, created at entry and threaded through the engine
//!   call, never stored in process-global state
//! - **Crash containment** - engine errors and panics become a fixed error
//!   envelope under a configurable status policy
//!
//! ## Request Lifecycle
//!
//! ```text
//! RECEIVED -> CORS_PRECHECK (OPTIONS: terminal 204)
//!          -> CONTEXT_SCOPE_ENTERED
//!          -> EXECUTING
//!          -> SUCCESS | ENGINE_ERROR | ADAPTER_CRASH
//!          -> CONTEXT_SCOPE_EXITED
//!          -> RESPONSE_SENT
//! ```
//!
//! An `OPTIONS` request terminates at the precheck with only CORS headers;
//! the engine is never invoked for it.

mod cors;
mod engine;
mod handler;
mod scope;
mod trusted;

pub use cors::{CorsOrigin, CorsPolicy};
pub use engine::{EngineRequest, EngineResponse, GraphQlEngine};
pub use handler::{CrashStatusPolicy, GraphQlHandler, GraphQlHandlerConfig};
pub use scope::{AuthDecoder, RequestScope};
pub use trusted::{TrustedOperationStore, TRUSTED_REJECTION_MESSAGE};
