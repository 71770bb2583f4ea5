//! Plugin analyzers.
//!
//! An analyzer is a recognition strategy: it decides whether a file is its
//! kind of plugin artifact and, if so, extracts the plugin's declared
//! metadata. The locator runs a configured, ordered list of analyzers over
//! every file it walks.
//!
//! [`ScriptAnalyzer`] recognizes plugins from the script itself, with no
//! sidecar descriptor. [`InfoFileAnalyzer`](super::info_file::InfoFileAnalyzer)
//! recognizes sidecar `*.plugin.json` descriptors.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;

use super::script::{has_script_suffix, is_package_entry_point, ScriptModule};
use super::types::{AnalyzedPlugin, PluginMetadata};

/// Script variable holding the required plugin name.
pub const PLUGIN_NAME_VAR: &str = "plugin_name";
/// Script variable holding the plugin author.
pub const PLUGIN_AUTHOR_VAR: &str = "plugin_author";
/// Script variable holding the plugin version.
pub const PLUGIN_VERSION_VAR: &str = "plugin_version";
/// Script variable holding the plugin website.
pub const PLUGIN_WEBSITE_VAR: &str = "plugin_website";
/// Script variable holding the plugin copyright.
pub const PLUGIN_COPYRIGHT_VAR: &str = "plugin_copyright";
/// Script variable holding the plugin description.
pub const PLUGIN_DESCRIPTION_VAR: &str = "plugin_description";

/// A plugin recognition strategy.
///
/// Implementations must not panic on arbitrary files; anything they cannot
/// recognize is reported as `false` from [`is_valid_plugin`](Self::is_valid_plugin).
pub trait PluginAnalyzer {
    /// Analyzer name, used for logging and for removing analyzers by name.
    fn name(&self) -> &str;

    /// Whether `path` is this analyzer's kind of plugin artifact.
    fn is_valid_plugin(&self, path: &Path) -> bool;

    /// Extract the declared plugin information from `dir/filename`.
    ///
    /// An `Err` means the file was recognized but is malformed. The locator
    /// treats that as a definitive rejection of the file.
    fn get_info(&self, dir: &Path, filename: &str) -> Result<AnalyzedPlugin>;
}

/// Recognizes Rhai scripts that declare a module-level `plugin_name`.
///
/// Both [`is_valid_plugin`](PluginAnalyzer::is_valid_plugin) and
/// [`get_info`](PluginAnalyzer::get_info) load the script, and nothing is
/// cached between them: a script's top-level statements run once to classify
/// it and again to read its metadata.
#[derive(Debug, Clone)]
pub struct ScriptAnalyzer {
    name: String,
}

impl ScriptAnalyzer {
    /// Create the analyzer with its default name, `ScriptAnalyzer`.
    pub fn new() -> Self {
        Self::with_name("ScriptAnalyzer")
    }

    /// Create the analyzer under a custom name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ScriptAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginAnalyzer for ScriptAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid_plugin(&self, path: &Path) -> bool {
        if !has_script_suffix(path) {
            return false;
        }

        match ScriptModule::load(path) {
            Ok(module) => module.has_variable(PLUGIN_NAME_VAR),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Not a plugin script");
                false
            }
        }
    }

    fn get_info(&self, dir: &Path, filename: &str) -> Result<AnalyzedPlugin> {
        let module_path = dir.join(filename);
        let module = ScriptModule::load(&module_path)?;

        let field = |var: &str| module.string_variable(var).unwrap_or_default();
        let metadata = PluginMetadata {
            name: field(PLUGIN_NAME_VAR),
            author: field(PLUGIN_AUTHOR_VAR),
            version: field(PLUGIN_VERSION_VAR),
            website: field(PLUGIN_WEBSITE_VAR),
            copyright: field(PLUGIN_COPYRIGHT_VAR),
            description: field(PLUGIN_DESCRIPTION_VAR),
        };

        // A package's entry point stands for the whole directory.
        let path = if is_package_entry_point(&module_path) {
            dir.to_path_buf()
        } else {
            module_path
        };

        Ok(AnalyzedPlugin {
            metadata,
            path,
            config: Value::Object(Map::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_is_valid_plugin_with_name() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "alpha.rhai", "let plugin_name = \"Alpha\";");
        assert!(ScriptAnalyzer::new().is_valid_plugin(&path));
    }

    #[test]
    fn test_is_valid_plugin_without_name() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "helper.rhai", "fn helper() { 1 }");
        assert!(!ScriptAnalyzer::new().is_valid_plugin(&path));
    }

    #[test]
    fn test_is_valid_plugin_wrong_suffix() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "readme.txt", "let plugin_name = \"Alpha\";");
        assert!(!ScriptAnalyzer::new().is_valid_plugin(&path));
    }

    #[test]
    fn test_is_valid_plugin_broken_script() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "broken.rhai", "let plugin_name = \"Alpha\"; }}}");
        assert!(!ScriptAnalyzer::new().is_valid_plugin(&path));
    }

    #[test]
    fn test_is_valid_plugin_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(!ScriptAnalyzer::new().is_valid_plugin(&tmp.path().join("ghost.rhai")));
    }

    #[test]
    fn test_get_info_full_metadata() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "alpha.rhai",
            r#"
let plugin_name = "Alpha";
let plugin_author = "Matt";
let plugin_version = "1.2.0";
let plugin_website = "https://example.com/alpha";
let plugin_copyright = "LGPL";
let plugin_description = "First plugin";
"#,
        );

        let info = ScriptAnalyzer::new().get_info(tmp.path(), "alpha.rhai").unwrap();
        assert_eq!(info.metadata.name, "Alpha");
        assert_eq!(info.metadata.author, "Matt");
        assert_eq!(info.metadata.version, "1.2.0");
        assert_eq!(info.metadata.website, "https://example.com/alpha");
        assert_eq!(info.metadata.copyright, "LGPL");
        assert_eq!(info.metadata.description, "First plugin");
        assert_eq!(info.path, tmp.path().join("alpha.rhai"));
        assert_eq!(info.config, Value::Object(Map::new()));
    }

    #[test]
    fn test_get_info_defaults_optional_fields() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "alpha.rhai", "const plugin_name = \"Alpha\";");

        let info = ScriptAnalyzer::new().get_info(tmp.path(), "alpha.rhai").unwrap();
        assert_eq!(info.metadata, PluginMetadata::named("Alpha"));
    }

    #[test]
    fn test_get_info_non_string_name_reads_empty() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "numeric.rhai", "let plugin_name = 7;");

        let info = ScriptAnalyzer::new().get_info(tmp.path(), "numeric.rhai").unwrap();
        assert!(!info.metadata.has_name());
    }

    #[test]
    fn test_get_info_package_entry_point_declares_directory() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("pkg");
        fs::create_dir(&pkg).unwrap();
        write(&pkg, "init.rhai", "let plugin_name = \"Beta\";");

        let info = ScriptAnalyzer::new().get_info(&pkg, "init.rhai").unwrap();
        assert_eq!(info.metadata.name, "Beta");
        assert_eq!(info.path, pkg);
    }

    #[test]
    fn test_get_info_unloadable_script() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "broken.rhai", "let = ;");
        assert!(ScriptAnalyzer::new().get_info(tmp.path(), "broken.rhai").is_err());
    }

    #[test]
    fn test_classify_then_extract_runs_top_level_twice() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "chatty.rhai",
            "print(\"chatty loaded\");\nlet plugin_name = \"Chatty\";",
        );
        crate::plugins::script::captured::take();

        let analyzer = ScriptAnalyzer::new();
        assert!(analyzer.is_valid_plugin(&path));
        let info = analyzer.get_info(tmp.path(), "chatty.rhai").unwrap();
        assert_eq!(info.metadata.name, "Chatty");

        let lines = crate::plugins::script::captured::take();
        assert_eq!(lines, vec!["chatty loaded".to_string(); 2]);
    }

    #[test]
    fn test_analyzer_names() {
        assert_eq!(ScriptAnalyzer::new().name(), "ScriptAnalyzer");
        assert_eq!(ScriptAnalyzer::with_name("Scripts").name(), "Scripts");
    }
}
