//! Plugin manager for Bareplug
//!
//! Thin composition root: configures a [`PluginLocator`], delegates
//! discovery to it, then loads and instantiates every candidate into a
//! [`PluginRegistry`].

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::PluginConfig;

use super::analyzer::ScriptAnalyzer;
use super::info_file::InfoFileAnalyzer;
use super::locator::PluginLocator;
use super::registry::{LoadedPlugin, PluginInstance, PluginRegistry};

/// Discovers, loads and holds plugins.
pub struct PluginManager {
    locator: PluginLocator,
    registry: PluginRegistry,
    config: PluginConfig,
}

impl PluginManager {
    /// Create a manager using the default locator (script analyzer, then
    /// `*.plugin.json` sidecars) and no search places.
    pub fn new() -> Self {
        Self::with_locator(PluginLocator::new())
    }

    /// Create a manager around a caller-supplied locator. The locator's
    /// analyzers fully replace the defaults.
    pub fn with_locator(locator: PluginLocator) -> Self {
        Self {
            locator,
            registry: PluginRegistry::new(),
            config: PluginConfig {
                plugin_dirs: Vec::new(),
                ..PluginConfig::default()
            },
        }
    }

    /// Create a manager from configuration: search places, recursion,
    /// sidecar extension and allow/block lists.
    ///
    /// An empty `info_extension` turns sidecar descriptors off.
    pub fn from_config(config: &PluginConfig) -> Self {
        let mut locator = PluginLocator::with_analyzers(vec![
            Box::new(ScriptAnalyzer::new()),
            Box::new(InfoFileAnalyzer::new(
                "InfoFileAnalyzer",
                config.info_extension.clone(),
            )),
        ]);
        if config.info_extension.trim().is_empty() {
            locator.remove_analyzers("InfoFileAnalyzer");
        }
        locator.set_search_places(config.search_dirs());
        locator.set_recursive(config.recursive);

        Self {
            locator,
            registry: PluginRegistry::new(),
            config: config.clone(),
        }
    }

    /// Replace the directories searched by [`collect`](Self::collect).
    pub fn set_search_places(&mut self, dirs: Vec<PathBuf>) {
        self.locator.set_search_places(dirs);
    }

    /// The locator used for discovery.
    pub fn locator(&self) -> &PluginLocator {
        &self.locator
    }

    /// Mutable access to the locator, e.g. to change its analyzers.
    pub fn locator_mut(&mut self) -> &mut PluginLocator {
        &mut self.locator
    }

    /// Discover and load plugins, replacing whatever was loaded before.
    ///
    /// Each candidate's module is loaded again and instantiated. Candidates
    /// whose module fails to load or whose `initialize` hook raises are
    /// logged and skipped.
    ///
    /// # Returns
    /// The number of plugins loaded.
    pub fn collect(&mut self) -> usize {
        self.registry.clear();

        let (candidates, count) = self.locator.collect();
        debug!(candidates = count, "Plugin discovery finished");

        for candidate in candidates {
            if !self.config.is_plugin_permitted(candidate.name()) {
                info!(plugin = %candidate.name(), "Plugin not permitted by config, skipping");
                continue;
            }

            match PluginInstance::instantiate(&candidate.executable_path) {
                Ok(instance) => self.registry.register(LoadedPlugin::new(candidate, instance)),
                Err(e) => {
                    warn!(
                        plugin = %candidate.name(),
                        path = %candidate.executable_path.display(),
                        error = %e,
                        "Failed to load plugin, skipping"
                    );
                }
            }
        }

        self.registry.plugin_count()
    }

    /// All loaded plugins, in discovery order.
    pub fn get_all_plugins(&self) -> &[LoadedPlugin] {
        self.registry.all()
    }

    /// The first loaded plugin declaring `name`.
    pub fn get_plugin_by_name(&self, name: &str) -> Option<&LoadedPlugin> {
        self.registry.get_plugin(name)
    }

    /// Mutable access to the first loaded plugin declaring `name`.
    pub fn get_plugin_by_name_mut(&mut self, name: &str) -> Option<&mut LoadedPlugin> {
        self.registry.get_plugin_mut(name)
    }

    /// The underlying registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
