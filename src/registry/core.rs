use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::error::GatewayError;
use crate::event::{LambdaEvent, LambdaResult};

/// A registered serverless function.
///
/// Handlers receive the Lambda-shaped event their authors declared and return
/// a Lambda-shaped result. Errors are contained at the dispatch boundary.
pub trait FunctionHandler: Send + Sync {
    fn handle(&self, event: LambdaEvent) -> Result<LambdaResult, GatewayError>;
}

impl<F> FunctionHandler for F
where
    F: Fn(LambdaEvent) -> Result<LambdaResult, GatewayError> + Send + Sync,
{
    fn handle(&self, event: LambdaEvent) -> Result<LambdaResult, GatewayError> {
        self(event)
    }
}

/// The shapes a function module may expose its handler under.
///
/// All four shapes normalize through [`ExportShape::resolve`] into at most one
/// callable; downstream code never matches on the shape again.
#[derive(Clone)]
pub enum ExportShape {
    /// A named `handler` function.
    Handler(Arc<dyn FunctionHandler>),
    /// A default export that is itself callable.
    DefaultFn(Arc<dyn FunctionHandler>),
    /// A default export object that may carry a `handler` member.
    DefaultObject {
        handler: Option<Arc<dyn FunctionHandler>>,
    },
    /// A module exposing nothing usable.
    None,
}

impl ExportShape {
    /// Normalize to the single callable this shape exposes, if any.
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<dyn FunctionHandler>> {
        match self {
            ExportShape::Handler(h) | ExportShape::DefaultFn(h) => Some(h.clone()),
            ExportShape::DefaultObject { handler } => handler.clone(),
            ExportShape::None => None,
        }
    }
}

impl std::fmt::Debug for ExportShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportShape::Handler(_) => "Handler",
            ExportShape::DefaultFn(_) => "DefaultFn",
            ExportShape::DefaultObject { .. } => "DefaultObject",
            ExportShape::None => "None",
        };
        write!(f, "ExportShape::{name}")
    }
}

/// One function module ready for loading: a route name plus its export shape.
#[derive(Debug, Clone)]
pub struct FunctionModule {
    pub route_name: String,
    pub shape: ExportShape,
}

impl FunctionModule {
    pub fn new(route_name: impl Into<String>, shape: ExportShape) -> Self {
        Self {
            route_name: route_name.into(),
            shape,
        }
    }
}

/// A loaded registry entry. `handler` is `None` for modules whose export
/// shape resolved to nothing; the dispatcher turns those into 404s.
#[derive(Clone)]
pub struct HandlerEntry {
    pub route_name: String,
    pub handler: Option<Arc<dyn FunctionHandler>>,
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("route_name", &self.route_name)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// An immutable view of the registry at one point in time.
///
/// Requests resolve against the snapshot they started with; a concurrent
/// reload never changes what an in-flight request sees.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    entries: HashMap<String, HandlerEntry>,
}

impl RegistrySnapshot {
    #[must_use]
    pub fn get(&self, route_name: &str) -> Option<&HandlerEntry> {
        self.entries.get(route_name)
    }

    /// All known route names, sorted. Used by the development 404 body.
    #[must_use]
    pub fn route_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hot-swappable registry of route name to handler.
pub struct FunctionRegistry {
    snapshot: ArcSwap<RegistrySnapshot>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
        }
    }

    /// Build a snapshot from the module batch and swap it in.
    ///
    /// The batch settles completely before the swap: a registry is never
    /// observable half-loaded. Returns the route names in load order.
    pub fn load(&self, mut modules: Vec<FunctionModule>) -> Vec<String> {
        let batch_start = Instant::now();

        // graphql is the heaviest module; load it first
        if let Some(idx) = modules.iter().position(|m| m.route_name == "graphql") {
            let graphql = modules.remove(idx);
            modules.insert(0, graphql);
        }

        let mut entries = HashMap::with_capacity(modules.len());
        let mut load_order = Vec::with_capacity(modules.len());
        let mut callable = 0usize;
        for module in modules {
            load_order.push(module.route_name.clone());
            let load_start = Instant::now();
            let handler = module.shape.resolve();
            match &handler {
                Some(_) => {
                    callable += 1;
                    info!(
                        route_name = %module.route_name,
                        load_time_ms = load_start.elapsed().as_millis() as u64,
                        "Imported function"
                    );
                }
                None => {
                    warn!(
                        route_name = %module.route_name,
                        shape = ?module.shape,
                        "Function module exposes no handler - registering null entry"
                    );
                }
            }
            entries.insert(
                module.route_name.clone(),
                HandlerEntry {
                    route_name: module.route_name,
                    handler,
                },
            );
        }

        let total = entries.len();
        self.snapshot
            .store(Arc::new(RegistrySnapshot { entries }));
        info!(
            total_functions = total,
            callable_functions = callable,
            batch_time_ms = batch_start.elapsed().as_millis() as u64,
            "Function registry loaded"
        );
        load_order
    }

    /// The current snapshot. Cheap; callers hold it for the request lifetime.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }
}
