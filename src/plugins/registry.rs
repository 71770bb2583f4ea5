//! Plugin registry for Bareplug
//!
//! This module provides the `PluginRegistry` struct holding the plugins a
//! manager has loaded and instantiated. Plugins are kept in load order;
//! declared names are not unique, so lookups by name return the first match.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rhai::Dynamic;
use tracing::info;

use crate::error::Result;

use super::script::{module_file, ScriptModule};
use super::types::{PluginCandidate, PluginMetadata};

/// Script function called once when a plugin is instantiated.
pub const INITIALIZE_HOOK: &str = "initialize";

/// A live plugin: its loaded module and the lifecycle hooks it defines.
pub struct PluginInstance {
    module: ScriptModule,
}

impl PluginInstance {
    /// Load the module behind `executable_path` and run its `initialize`
    /// hook, if it defines one.
    ///
    /// # Errors
    /// - `BareplugError::Script` if the module fails to load or `initialize`
    ///   raises
    pub fn instantiate(executable_path: &Path) -> Result<Self> {
        let module = ScriptModule::load(&module_file(executable_path))?;
        let mut instance = Self { module };
        instance.call_hook(INITIALIZE_HOOK)?;
        Ok(instance)
    }

    /// Call a no-argument hook function.
    ///
    /// Returns `Ok(None)` when the plugin does not define `name`.
    pub fn call_hook(&mut self, name: &str) -> Result<Option<Dynamic>> {
        if !self.module.has_function(name) {
            return Ok(None);
        }
        self.module.call_function(name).map(Some)
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("module", &self.module.path())
            .finish()
    }
}

/// A plugin the manager has loaded.
#[derive(Debug)]
pub struct LoadedPlugin {
    /// Declared plugin name.
    pub name: String,

    /// Executable module reference (without `.rhai`).
    pub path: PathBuf,

    /// The file an analyzer matched to discover the plugin.
    pub identity_path: PathBuf,

    /// Declared metadata.
    pub metadata: PluginMetadata,

    /// The instantiated plugin.
    pub instance: PluginInstance,
}

impl LoadedPlugin {
    /// Combine a discovery candidate with its instance.
    pub fn new(candidate: PluginCandidate, instance: PluginInstance) -> Self {
        Self {
            name: candidate.metadata.name.clone(),
            path: candidate.executable_path,
            identity_path: candidate.identity_path,
            metadata: candidate.metadata,
            instance,
        }
    }
}

/// Loaded plugins in load order, indexed by declared name.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<LoadedPlugin>,

    /// Map from plugin name to the indices of plugins declaring it.
    by_name: HashMap<String, Vec<usize>>,
}

impl PluginRegistry {
    /// Create a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loaded plugin.
    pub fn register(&mut self, plugin: LoadedPlugin) {
        info!(
            plugin = %plugin.name,
            path = %plugin.path.display(),
            "Registered plugin"
        );
        self.by_name
            .entry(plugin.name.clone())
            .or_default()
            .push(self.plugins.len());
        self.plugins.push(plugin);
    }

    /// Get the first plugin registered under `name`.
    pub fn get_plugin(&self, name: &str) -> Option<&LoadedPlugin> {
        let index = *self.by_name.get(name)?.first()?;
        self.plugins.get(index)
    }

    /// Mutable access to the first plugin registered under `name`.
    pub fn get_plugin_mut(&mut self, name: &str) -> Option<&mut LoadedPlugin> {
        let index = *self.by_name.get(name)?.first()?;
        self.plugins.get_mut(index)
    }

    /// All plugins registered under `name`, in load order.
    pub fn plugins_named(&self, name: &str) -> Vec<&LoadedPlugin> {
        self.by_name
            .get(name)
            .map(|indices| indices.iter().filter_map(|&i| self.plugins.get(i)).collect())
            .unwrap_or_default()
    }

    /// All plugins in load order.
    pub fn all(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    /// Get the number of registered plugins.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Remove every plugin.
    pub fn clear(&mut self) {
        self.plugins.clear();
        self.by_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    /// Helper to write a plugin script and build a matching candidate.
    fn make_candidate(dir: &Path, file_stem: &str, name: &str, body: &str) -> PluginCandidate {
        let script = dir.join(format!("{}.rhai", file_stem));
        fs::write(&script, format!("let plugin_name = \"{}\";\n{}", name, body)).unwrap();
        PluginCandidate {
            identity_path: script,
            executable_path: dir.join(file_stem),
            metadata: PluginMetadata::named(name),
            config: json!({}),
            analyzer: "ScriptAnalyzer".to_string(),
        }
    }

    fn load(candidate: PluginCandidate) -> LoadedPlugin {
        let instance = PluginInstance::instantiate(&candidate.executable_path).unwrap();
        LoadedPlugin::new(candidate, instance)
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = PluginRegistry::new();
        assert_eq!(registry.plugin_count(), 0);
        assert!(registry.all().is_empty());
        assert!(registry.get_plugin("nonexistent").is_none());
    }

    #[test]
    fn test_instantiate_runs_initialize() {
        let tmp = TempDir::new().unwrap();
        let candidate = make_candidate(
            tmp.path(),
            "alpha",
            "Alpha",
            "fn initialize() { \"ready\" }\nfn activate() { 1 }",
        );

        let mut instance = PluginInstance::instantiate(&candidate.executable_path).unwrap();
        assert_eq!(instance.call_hook("activate").unwrap().unwrap().as_int().unwrap(), 1);
        assert!(instance.call_hook("deactivate").unwrap().is_none());
    }

    #[test]
    fn test_instantiate_without_initialize() {
        let tmp = TempDir::new().unwrap();
        let candidate = make_candidate(tmp.path(), "plain", "Plain", "");
        assert!(PluginInstance::instantiate(&candidate.executable_path).is_ok());
    }

    #[test]
    fn test_instantiate_failing_initialize() {
        let tmp = TempDir::new().unwrap();
        let candidate = make_candidate(
            tmp.path(),
            "broken",
            "Broken",
            "fn initialize() { throw \"cannot start\"; }",
        );
        assert!(PluginInstance::instantiate(&candidate.executable_path).is_err());
    }

    #[test]
    fn test_instantiate_missing_module() {
        let tmp = TempDir::new().unwrap();
        assert!(PluginInstance::instantiate(&tmp.path().join("ghost")).is_err());
    }

    #[test]
    fn test_register_and_lookup_plugin() {
        let tmp = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        registry.register(load(make_candidate(tmp.path(), "alpha", "Alpha", "")));

        let found = registry.get_plugin("Alpha").unwrap();
        assert_eq!(found.name, "Alpha");
        assert_eq!(found.path, tmp.path().join("alpha"));
        assert_eq!(found.identity_path, tmp.path().join("alpha.rhai"));
        assert_eq!(registry.plugin_count(), 1);
    }

    #[test]
    fn test_duplicate_names_are_kept_in_order() {
        let tmp = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        registry.register(load(make_candidate(tmp.path(), "one", "Dup", "")));
        registry.register(load(make_candidate(tmp.path(), "two", "Dup", "")));

        assert_eq!(registry.plugin_count(), 2);
        assert_eq!(registry.get_plugin("Dup").unwrap().path, tmp.path().join("one"));

        let named = registry.plugins_named("Dup");
        assert_eq!(named.len(), 2);
        assert_eq!(named[1].path, tmp.path().join("two"));
    }

    #[test]
    fn test_get_plugin_mut_calls_hook() {
        let tmp = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        registry.register(load(make_candidate(
            tmp.path(),
            "alpha",
            "Alpha",
            "fn activate() { true }",
        )));

        let plugin = registry.get_plugin_mut("Alpha").unwrap();
        let result = plugin.instance.call_hook("activate").unwrap().unwrap();
        assert!(result.as_bool().unwrap());
    }

    #[test]
    fn test_clear() {
        let tmp = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        registry.register(load(make_candidate(tmp.path(), "alpha", "Alpha", "")));

        registry.clear();
        assert_eq!(registry.plugin_count(), 0);
        assert!(registry.get_plugin("Alpha").is_none());
        assert!(registry.plugins_named("Alpha").is_empty());
    }
}
