//! Sidecar info-file analyzer.
//!
//! Recognizes `<anything>.plugin.json` descriptors sitting next to the plugin
//! code. The descriptor names the plugin and points at its module:
//!
//! ```json
//! {
//!   "name": "Gamma",
//!   "module": "gamma",
//!   "author": "Matt",
//!   "version": "0.3.0",
//!   "description": "Described by a sidecar file"
//! }
//! ```
//!
//! `module` is relative to the descriptor's directory and may name a package
//! directory, a `.rhai` file, or a module path without the suffix.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{BareplugError, Result};

use super::analyzer::PluginAnalyzer;
use super::types::{AnalyzedPlugin, PluginMetadata};

/// Default sidecar extension (without the leading dot).
pub const DEFAULT_INFO_EXTENSION: &str = "plugin.json";

#[derive(Debug, Deserialize)]
struct InfoFile {
    name: String,
    module: String,
    #[serde(flatten)]
    metadata: PluginMetadata,
}

/// Analyzer for JSON sidecar descriptors.
#[derive(Debug, Clone)]
pub struct InfoFileAnalyzer {
    name: String,
    extension: String,
}

impl InfoFileAnalyzer {
    /// Create an analyzer matching files ending in `.<extension>`.
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            name: name.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// The sidecar extension this analyzer matches, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Default for InfoFileAnalyzer {
    fn default() -> Self {
        Self::new("InfoFileAnalyzer", DEFAULT_INFO_EXTENSION)
    }
}

impl PluginAnalyzer for InfoFileAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid_plugin(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(&format!(".{}", self.extension)))
            .unwrap_or(false)
    }

    fn get_info(&self, dir: &Path, filename: &str) -> Result<AnalyzedPlugin> {
        let info_path = dir.join(filename);
        let content = fs::read_to_string(&info_path)?;
        let config: Value = serde_json::from_str(&content)?;
        let info: InfoFile = serde_json::from_value(config.clone())?;

        if info.module.trim().is_empty() {
            return Err(BareplugError::InvalidPlugin(format!(
                "Empty module in {}",
                info_path.display()
            )));
        }

        let metadata = PluginMetadata {
            name: info.name,
            ..info.metadata
        };

        Ok(AnalyzedPlugin {
            metadata,
            path: dir.join(info.module.trim()),
            config,
        })
    }
}
