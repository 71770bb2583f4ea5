//! Plugin types for Bareplug
//!
//! This module defines the data passed between analyzers, the locator and
//! the manager: declared plugin metadata, an analyzer's extraction result,
//! and the resolved discovery candidate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Metadata a plugin declares about itself.
///
/// Every field except `name` is optional in the source declaration and
/// defaults to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginMetadata {
    /// Plugin name. Must be non-empty for a plugin to be accepted.
    pub name: String,

    /// Whoever to blame for the plugin.
    pub author: String,

    /// Version string, free-form.
    pub version: String,

    /// URL for the plugin, if applicable.
    pub website: String,

    /// Copyright or licence information.
    pub copyright: String,

    /// Short description of what the plugin does.
    pub description: String,
}

impl PluginMetadata {
    /// Create metadata with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the declared name is usable (non-empty after trimming).
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// What an analyzer extracted from a file it recognized.
#[derive(Debug, Clone)]
pub struct AnalyzedPlugin {
    /// Declared metadata.
    pub metadata: PluginMetadata,

    /// Declared location of the plugin code: a package directory, a module
    /// file, or a module path without its `.rhai` suffix.
    pub path: PathBuf,

    /// Auxiliary configuration. Sidecar-based analyzers return the parsed
    /// descriptor; script analysis has none and returns an empty object.
    pub config: Value,
}

/// A resolved, deduplicated plugin ready for loading.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginCandidate {
    /// The file an analyzer matched.
    pub identity_path: PathBuf,

    /// Module reference to load, without the `.rhai` suffix. For packages
    /// this is the directory's `init` entry point.
    pub executable_path: PathBuf,

    /// Declared metadata. `name` is always non-empty.
    pub metadata: PluginMetadata,

    /// Auxiliary configuration returned by the claiming analyzer.
    pub config: Value,

    /// Name of the analyzer that claimed the file.
    pub analyzer: String,
}

impl PluginCandidate {
    /// Get the declared plugin name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}
