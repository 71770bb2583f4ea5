//! Rhai script modules.
//!
//! Loading a plugin module means compiling it and running its top-level
//! statements in a fresh `Engine` and `Scope`. Nothing is shared between two
//! loads of the same file, so every load re-runs the module's side effects
//! (prints, imports, anything else at top level). Classifying a file as a
//! plugin therefore executes it.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use rhai::module_resolvers::FileModuleResolver;
use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};
use tracing::{debug, info};

use crate::error::{BareplugError, Result};

/// Recognized source-file extension for plugin modules (without the dot).
pub const SCRIPT_EXTENSION: &str = "rhai";

/// File stem of a package's entry point (`<package>/init.rhai`).
pub const PACKAGE_ENTRY_POINT: &str = "init";

/// Whether `path` ends in the `.rhai` suffix.
pub fn has_script_suffix(path: &Path) -> bool {
    path.to_str()
        .map(|s| s.ends_with(&format!(".{}", SCRIPT_EXTENSION)))
        .unwrap_or(false)
}

/// Strip a trailing `.rhai` from `path`, if present.
pub fn strip_script_suffix(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => match s.strip_suffix(&format!(".{}", SCRIPT_EXTENSION)) {
            Some(stripped) => PathBuf::from(stripped),
            None => path.to_path_buf(),
        },
        None => path.to_path_buf(),
    }
}

/// Append `.rhai` to a module reference.
///
/// Unlike `Path::with_extension` this never replaces an existing dotted
/// component, so `plugins/tool.v2` becomes `plugins/tool.v2.rhai`.
pub fn module_file(module: &Path) -> PathBuf {
    let mut raw = OsString::from(module.as_os_str());
    raw.push(".");
    raw.push(SCRIPT_EXTENSION);
    PathBuf::from(raw)
}

/// Whether `path` is a package entry point (`init.rhai`).
pub fn is_package_entry_point(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == format!("{}.{}", PACKAGE_ENTRY_POINT, SCRIPT_EXTENSION))
        .unwrap_or(false)
}

/// A compiled and evaluated script together with the scope its top-level
/// statements left behind.
pub struct ScriptModule {
    path: PathBuf,
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
}

impl ScriptModule {
    /// Load the script at `path` in an isolated engine.
    ///
    /// Imports resolve relative to the script's own directory. `print`
    /// output is logged at `info`, `debug` output at `debug`.
    ///
    /// # Errors
    /// - `BareplugError::Script` if the file does not end in `.rhai`, does
    ///   not compile, raises at top level, or imports a missing module
    pub fn load(path: &Path) -> Result<Self> {
        if !has_script_suffix(path) {
            return Err(BareplugError::Script(format!(
                "{} is not a .{} file",
                path.display(),
                SCRIPT_EXTENSION
            )));
        }

        let mut engine = Engine::new();
        if let Some(dir) = path.parent() {
            engine.set_module_resolver(FileModuleResolver::new_with_path(dir));
        }

        let source = path.display().to_string();
        engine.on_print(move |text| {
            #[cfg(test)]
            captured::record(text);
            info!(module = %source, "{}", text);
        });
        let source = path.display().to_string();
        engine.on_debug(move |text, _, pos| {
            #[cfg(test)]
            captured::record(text);
            debug!(module = %source, position = %pos, "{}", text);
        });

        let ast = engine.compile_file(path.to_path_buf()).map_err(|e| {
            BareplugError::Script(format!("Failed to compile {}: {}", path.display(), e))
        })?;

        let mut scope = Scope::new();
        engine.run_ast_with_scope(&mut scope, &ast).map_err(|e| {
            BareplugError::Script(format!("Failed to run {}: {}", path.display(), e))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            engine,
            ast,
            scope,
        })
    }

    /// Path the module was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the module defines a top-level variable or constant `name`
    /// bound to something other than `()`.
    pub fn has_variable(&self, name: &str) -> bool {
        self.scope
            .get_value::<Dynamic>(name)
            .map(|value| !value.is_unit())
            .unwrap_or(false)
    }

    /// Read a top-level string variable, `None` if absent or not a string.
    pub fn string_variable(&self, name: &str) -> Option<String> {
        self.scope
            .get_value::<Dynamic>(name)
            .and_then(|value| value.into_string().ok())
    }

    /// Whether the script defines a function called `name`.
    pub fn has_function(&self, name: &str) -> bool {
        self.ast.iter_functions().any(|f| f.name == name)
    }

    /// Call a script function with no arguments.
    ///
    /// Top-level statements are not re-run; the call sees the scope left by
    /// the initial load.
    pub fn call_function(&mut self, name: &str) -> Result<Dynamic> {
        let options = CallFnOptions::new().eval_ast(false);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, &self.ast, name, ())
            .map_err(|e| {
                BareplugError::Script(format!(
                    "Function '{}' in {} failed: {}",
                    name,
                    self.path.display(),
                    e
                ))
            })
    }
}

impl fmt::Debug for ScriptModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptModule")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
