//! # Event Normalization Module
//!
//! Converts heterogeneous inbound request representations into one canonical
//! shape, and canonical responses back into the correct outbound shape.
//!
//! ## Overview
//!
//! The gateway accepts requests from three transports:
//!
//! - **Lambda-style proxy events** - `{httpMethod, path, headers,
//!   multiValueHeaders, queryStringParameters, body, isBase64Encoded, ...}`
//! - **Parsed gateway HTTP requests** - produced by the server module from
//!   `may_minihttp` requests
//! - **Fetch-style requests** - method + URL + headers + byte body, used by
//!   the streaming render coordinator
//!
//! Each transport converts to a [`NormalizedRequest`] at the boundary, and a
//! [`NormalizedResponse`] converts back on the way out. Everything between
//! the boundaries (dispatcher, GraphQL adapter, middleware, renderer) only
//! ever sees the normalized shapes.
//!
//! ## Invariants
//!
//! - Header lookups are case-insensitive; multi-value headers preserve order.
//! - A normalized request is immutable once constructed; transformations
//!   produce new instances.
//! - Query keys appearing more than once fold into an ordered sequence.
//! - Emitting to a multi-value transport always yields sequences, one-element
//!   for single values, so the receiving side handles one shape.

mod fetch;
mod lambda;
mod normalized;

pub use fetch::{FetchBody, FetchRequest, FetchResponse};
pub use lambda::{
    lambda_event_from_normalized, lambda_event_to_normalized, lambda_result_from_normalized,
    lambda_result_to_normalized, LambdaEvent, LambdaIdentity, LambdaRequestContext, LambdaResult,
};
pub use normalized::{Body, Headers, NormalizedRequest, NormalizedResponse, QueryParams};
