//! Plugin system for Bareplug
//!
//! This module discovers and loads plugins written as Rhai scripts without
//! requiring a descriptor file per plugin. A script is a plugin when it
//! compiles, runs cleanly, and declares a top-level `plugin_name`. Optional
//! metadata lives next to it in the same script.
//!
//! # Architecture
//!
//! - **script**: Loading a `.rhai` file in an isolated engine
//! - **analyzer**: The `PluginAnalyzer` trait and the sidecar-less `ScriptAnalyzer`
//! - **info_file**: `InfoFileAnalyzer` for `*.plugin.json` sidecar descriptors
//! - **locator**: Directory walk, per-file analyzer resolution and deduplication
//! - **registry**: Loaded plugin instances
//! - **manager**: Wires a locator to a registry
//!
//! # Plugin Layout
//!
//! ```text
//! ~/.bareplug/plugins/
//! ├── alpha.rhai              single-file plugin
//! ├── beta/                   package plugin
//! │   ├── init.rhai           entry point, declares plugin_name
//! │   └── helper.rhai         owned by beta, never its own plugin
//! ├── gamma.rhai              module described by the sidecar below
//! └── gamma.plugin.json
//! ```
//!
//! # Example alpha.rhai
//!
//! ```text
//! let plugin_name = "Alpha";
//! let plugin_author = "Matt";
//! let plugin_version = "1.0.0";
//!
//! fn initialize() {
//!     print("alpha ready");
//! }
//! ```
//!
//! Top-level statements run every time the script is loaded, and discovery
//! loads each candidate script to classify it. Only point the locator at
//! directories whose scripts are trusted.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use bareplug::plugins::PluginManager;
//!
//! let mut manager = PluginManager::new();
//! manager.set_search_places(vec![PathBuf::from("/home/user/.bareplug/plugins")]);
//! let loaded = manager.collect();
//!
//! for plugin in manager.get_all_plugins() {
//!     println!("{} from {}", plugin.name, plugin.path.display());
//! }
//! println!("Loaded {} plugins", loaded);
//! ```

pub mod analyzer;
pub mod info_file;
mod locator;
mod manager;
pub mod registry;
pub mod script;
pub mod types;

pub use analyzer::{PluginAnalyzer, ScriptAnalyzer};
pub use info_file::InfoFileAnalyzer;
pub use locator::PluginLocator;
pub use manager::PluginManager;
pub use registry::{LoadedPlugin, PluginInstance, PluginRegistry};
pub use types::{AnalyzedPlugin, PluginCandidate, PluginMetadata};
