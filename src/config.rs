//! Plugin system configuration.
//!
//! ```json
//! {
//!     "plugin_dirs": ["~/.bareplug/plugins", "./plugins"],
//!     "recursive": true,
//!     "info_extension": "plugin.json",
//!     "allowed_plugins": [],
//!     "blocked_plugins": ["Noisy Plugin"]
//! }
//! ```
//!
//! Every field is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BareplugError, Result};
use crate::plugins::info_file::DEFAULT_INFO_EXTENSION;

/// Plugin discovery and loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directories to search for plugins. `~` expands to the home directory.
    /// Defaults to `["~/.bareplug/plugins"]`.
    #[serde(default = "default_plugin_dirs")]
    pub plugin_dirs: Vec<String>,

    /// Whether subdirectories are searched. Defaults to true.
    #[serde(default = "default_recursive")]
    pub recursive: bool,

    /// Extension of sidecar info files. Defaults to `plugin.json`. An empty
    /// value disables sidecar descriptors.
    #[serde(default = "default_info_extension")]
    pub info_extension: String,

    /// Allowlist of plugin names. If empty, all discovered plugins are allowed.
    #[serde(default)]
    pub allowed_plugins: Vec<String>,

    /// Blocklist of plugin names. If empty, no plugins are blocked.
    /// Blocklist takes precedence over allowlist.
    #[serde(default)]
    pub blocked_plugins: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            plugin_dirs: default_plugin_dirs(),
            recursive: default_recursive(),
            info_extension: default_info_extension(),
            allowed_plugins: Vec::new(),
            blocked_plugins: Vec::new(),
        }
    }
}

impl PluginConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// - `BareplugError::Config` if the file cannot be read
    /// - `BareplugError::Json` if the JSON is malformed
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BareplugError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: PluginConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Search directories with `~` expanded.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        self.plugin_dirs.iter().map(|d| expand_home(d)).collect()
    }

    /// Check whether a plugin name is permitted by the allow/block lists.
    ///
    /// A plugin is permitted if:
    /// - It is not in the blocked list, AND
    /// - The allowed list is empty (all plugins allowed) OR the plugin is in the allowed list.
    pub fn is_plugin_permitted(&self, name: &str) -> bool {
        if self.blocked_plugins.iter().any(|b| b == name) {
            return false;
        }
        if self.allowed_plugins.is_empty() {
            return true;
        }
        self.allowed_plugins.iter().any(|a| a == name)
    }
}

fn default_plugin_dirs() -> Vec<String> {
    vec!["~/.bareplug/plugins".to_string()]
}

fn default_recursive() -> bool {
    true
}

fn default_info_extension() -> String {
    DEFAULT_INFO_EXTENSION.to_string()
}

fn expand_home(dir: &str) -> PathBuf {
    if dir == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = dir.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(dir)
}
