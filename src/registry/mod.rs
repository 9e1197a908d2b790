//! # Function Registry Module
//!
//! Maps route names to handler functions and keeps that map hot-swappable for
//! development reloads.
//!
//! ## Overview
//!
//! The registry is assembled in three steps:
//!
//! 1. **Discovery** - [`discover`] walks the functions directory (bounded to
//!    two levels) and returns candidate function files.
//! 2. **Resolution** - each discovered file pairs with an explicitly
//!    registered plugin in a [`PluginSet`]; the plugin's [`ExportShape`]
//!    normalizes to either a callable handler or a null entry.
//! 3. **Load** - [`FunctionRegistry::load`] builds an immutable snapshot from
//!    the resolved modules and swaps it in atomically.
//!
//! ## Load Semantics
//!
//! - The `graphql` route is moved to the front of the load batch so the
//!   heaviest function is ready first.
//! - A module that yields no callable registers a null entry with a warning;
//!   it never aborts the batch. Requests hitting it get a 404.
//! - Only failure to enumerate the directory aborts.
//!
//! ## Hot Reload
//!
//! [`watch_functions`] attaches a filesystem watcher to the functions
//! directory. On change the whole snapshot is rebuilt and swapped; in-flight
//! requests keep the snapshot they started with, and a rebuild failure leaves
//! the previous snapshot active.

mod core;
mod discover;
mod reload;

pub use core::{
    ExportShape, FunctionHandler, FunctionModule, FunctionRegistry, HandlerEntry, RegistrySnapshot,
};
pub use discover::{discover, route_name_for, PluginSet};
pub use reload::watch_functions;
