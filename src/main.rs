use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use fngate::dispatcher::Dispatcher;
use fngate::event::{LambdaEvent, LambdaResult};
use fngate::registry::{
    discover, watch_functions, ExportShape, FunctionRegistry, PluginSet,
};
use fngate::render::{
    EntryCache, EntryLoader, PageRenderer, RenderCoordinator, RenderCoordinatorConfig,
    RenderInput, RouteManifest,
};
use fngate::middleware::MiddlewareRouter;
use fngate::server::{GatewayService, HttpServer};
use fngate::stream::ChunkSender;
use fngate::{GatewayError, RuntimeConfig};

#[derive(Parser)]
#[command(name = "fngate")]
#[command(about = "Serverless-function gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway with echo functions for every discovered file
    Serve {
        /// Directory of function files to discover
        #[arg(short, long)]
        functions: PathBuf,

        /// Build-time route manifest for page routes
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Rebuild the registry when function files change
        #[arg(long, default_value_t = false)]
        watch: bool,

        #[arg(long, default_value = "0.0.0.0:8910")]
        addr: String,
    },
    /// Discover function files and print the routes that would register
    Routes {
        #[arg(short, long)]
        functions: PathBuf,
    },
}

/// Placeholder function used when serving without real plugins: echoes the
/// event back, the same shape a registered handler would return.
fn echo_shape() -> ExportShape {
    ExportShape::Handler(Arc::new(|event: LambdaEvent| -> Result<LambdaResult, GatewayError> {
        Ok(LambdaResult {
            status_code: 200,
            body: serde_json::to_string(&event)
                .map_err(|e| GatewayError::BodyDecode(e.to_string()))?,
            ..Default::default()
        })
    }))
}

struct StaticEntryLoader;

impl EntryLoader for StaticEntryLoader {
    fn load(&self) -> Result<(Arc<dyn PageRenderer>, String), GatewayError> {
        struct ShellRenderer;
        impl PageRenderer for ShellRenderer {
            fn render(&self, input: RenderInput, tx: ChunkSender) -> Result<(), GatewayError> {
                tx.send(format!("<html><body>{}</body></html>", input.request.url.path()));
                Ok(())
            }
        }
        Ok((
            Arc::new(ShellRenderer),
            "<html><body>Something went wrong</body></html>".to_string(),
        ))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = RuntimeConfig::from_env();
    may::config().set_stack_size(config.stack_size);

    match cli.command {
        Commands::Routes { functions } => {
            let files = discover(&functions, "rs")?;
            let mut plugins = PluginSet::new();
            for file in &files {
                plugins.register(fngate::registry::route_name_for(file), echo_shape());
            }
            for module in plugins.modules_for(&files) {
                println!(
                    "{}  ({})",
                    module.route_name,
                    if module.shape.resolve().is_some() {
                        "registered"
                    } else {
                        "no plugin"
                    }
                );
            }
            Ok(())
        }
        Commands::Serve {
            functions,
            manifest,
            watch,
            addr,
        } => {
            let mut plugins = PluginSet::new();
            let files = discover(&functions, "rs")?;
            for file in &files {
                plugins.register(fngate::registry::route_name_for(file), echo_shape());
            }
            let plugins = Arc::new(plugins);

            let registry = Arc::new(FunctionRegistry::new());
            registry.load(plugins.modules_for(&files));

            let dispatcher = Arc::new(Dispatcher::new(registry.clone(), config.mode));
            let mut service = GatewayService::new(dispatcher);

            if let Some(manifest_path) = manifest {
                let manifest = RouteManifest::load(&manifest_path)?;
                let coordinator = RenderCoordinator::new(
                    manifest,
                    MiddlewareRouter::new(),
                    EntryCache::new(Arc::new(StaticEntryLoader), config.mode),
                    HashMap::new(),
                    RenderCoordinatorConfig {
                        mode: config.mode,
                        stack_size: config.stack_size,
                    },
                );
                service = service.with_coordinator(Arc::new(coordinator));
            }

            if watch {
                let watcher = watch_functions(&functions, "rs", registry, plugins)?;
                service = service.with_watcher(watcher);
            }

            info!(addr = %addr, mode = ?config.mode, "Starting gateway");
            let handle = HttpServer(service).start(addr)?;
            handle
                .join()
                .map_err(|e| anyhow::anyhow!("server exited: {e:?}"))?;
            Ok(())
        }
    }
}
