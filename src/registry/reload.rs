use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use super::core::FunctionRegistry;
use super::discover::{discover, PluginSet};

/// Watch a functions directory and rebuild the registry when it changes.
///
/// Development only. Every create, modify, or remove under `dir` triggers a
/// full re-discovery and an atomic snapshot swap; a discovery failure is
/// logged and the previous snapshot stays active. The returned watcher must be
/// kept alive for the watch to continue.
pub fn watch_functions(
    dir: impl AsRef<Path>,
    extension: &str,
    registry: Arc<FunctionRegistry>,
    plugins: Arc<PluginSet>,
) -> notify::Result<RecommendedWatcher> {
    let dir: PathBuf = dir.as_ref().to_path_buf();
    let watch_dir = dir.clone();
    let extension = extension.to_string();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    match discover(&watch_dir, &extension) {
                        Ok(files) => {
                            let modules = plugins.modules_for(&files);
                            info!(
                                modules = modules.len(),
                                "hot-reload: rebuilding function registry"
                            );
                            registry.load(modules);
                        }
                        Err(e) => {
                            warn!(error = %e, "hot-reload: discovery failed, keeping previous registry");
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::Recursive)?;
    Ok(watcher)
}
