use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::GatewayError;

use super::core::{ExportShape, FunctionModule};

/// Walk `dir` for function files with the given extension.
///
/// The walk is bounded to two levels: top-level function files plus one
/// directory of nesting (`graphql.rs` and `auth/auth.rs` both qualify,
/// `a/b/c.rs` does not). Hidden files are skipped. Results are sorted for
/// deterministic load order. Enumeration failure is the one discovery error
/// that aborts.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, GatewayError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(2) {
        let entry = entry.map_err(|e| GatewayError::Discovery(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        if entry.path().extension().is_some_and(|e| e == extension) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    debug!(dir = %dir.display(), count = files.len(), "Discovered function files");
    Ok(files)
}

/// Route name for a function file: its stem, e.g. `graphql.rs` -> `graphql`.
#[must_use]
pub fn route_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Explicitly registered function plugins, keyed by route name.
///
/// Handlers are compiled in and registered here at startup; discovery then
/// decides which of them become live routes. A discovered file with no
/// registered plugin yields a null module (served as 404, with a load
/// warning), never an abort.
#[derive(Default)]
pub struct PluginSet {
    plugins: HashMap<String, ExportShape>,
}

impl PluginSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under a route name. Re-registration replaces.
    pub fn register(&mut self, route_name: impl Into<String>, shape: ExportShape) {
        self.plugins.insert(route_name.into(), shape);
    }

    #[must_use]
    pub fn contains(&self, route_name: &str) -> bool {
        self.plugins.contains_key(route_name)
    }

    /// Pair discovered files with registered plugins, producing the module
    /// batch for [`super::FunctionRegistry::load`].
    #[must_use]
    pub fn modules_for(&self, files: &[PathBuf]) -> Vec<FunctionModule> {
        files
            .iter()
            .map(|path| {
                let route_name = route_name_for(path);
                let shape = match self.plugins.get(&route_name) {
                    Some(shape) => shape.clone(),
                    None => {
                        warn!(
                            route_name = %route_name,
                            path = %path.display(),
                            "No plugin registered for discovered function file"
                        );
                        ExportShape::None
                    }
                };
                FunctionModule::new(route_name, shape)
            })
            .collect()
    }

    /// Module batch from registration alone, for deployments without a
    /// functions directory on disk.
    #[must_use]
    pub fn all_modules(&self) -> Vec<FunctionModule> {
        self.plugins
            .iter()
            .map(|(name, shape)| FunctionModule::new(name.clone(), shape.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_bounded_to_two_levels() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("graphql.rs"), "").unwrap();
        fs::create_dir(dir.path().join("auth")).unwrap();
        fs::write(dir.path().join("auth/auth.rs"), "").unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/deep.rs"), "").unwrap();
        fs::write(dir.path().join(".hidden.rs"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = discover(dir.path(), "rs").unwrap();
        let names: Vec<String> = files.iter().map(|p| route_name_for(p)).collect();
        assert_eq!(names, vec!["auth", "graphql"]);
    }

    #[test]
    fn test_unregistered_file_becomes_null_module() {
        let set = PluginSet::new();
        let modules = set.modules_for(&[PathBuf::from("/fns/mystery.rs")]);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].route_name, "mystery");
        assert!(modules[0].shape.resolve().is_none());
    }
}
