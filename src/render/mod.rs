//! # Streaming Render Coordinator
//!
//! Serves page routes: route matching against the build-time manifest,
//! middleware, route hooks, and streaming HTML render with an error fallback.
//!
//! ## Pipeline
//!
//! ```text
//! MATCH_ROUTE -> RUN_MIDDLEWARE -> [REDIRECT terminal]
//!             -> LOAD_ENTRY_MODULES -> RUN_ROUTE_HOOKS
//!             -> STREAM_RENDER -> [RENDER_ERROR -> fallback document
//!                                 | SUCCESS -> stream]
//! ```
//!
//! Route matching happens before middleware; an unmatched path fails fast
//! with `RouteNotFound` and never runs a chain. Crawler user agents get the
//! fully-buffered document so they never index a partial page; everyone else
//! streams chunk by chunk. A render failure is served as the static fallback
//! document rather than a bare error page, so the client shell still boots.

mod bot;
mod coordinator;
mod entries;
mod manifest;

pub use bot::is_crawler;
pub use coordinator::{RenderCoordinator, RenderCoordinatorConfig};
pub use entries::{EntryCache, EntryLoader, PageRenderer, RenderInput, RouteHooks};
pub use manifest::{RouteManifest, RouteManifestItem};
