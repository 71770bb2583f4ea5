//! Plugin discovery for Bareplug
//!
//! The locator walks its search places, runs every configured analyzer over
//! each file, resolves what the analyzer declared into a single-file or
//! package plugin, and deduplicates by claimed path. All state of a
//! discovery pass lives in a [`DiscoveryState`] value threaded through the
//! walk, so passes never share anything.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::analyzer::{PluginAnalyzer, ScriptAnalyzer};
use super::info_file::InfoFileAnalyzer;
use super::script::{
    has_script_suffix, is_package_entry_point, module_file, strip_script_suffix,
    PACKAGE_ENTRY_POINT,
};
use super::types::PluginCandidate;

/// Bookkeeping for one discovery pass.
#[derive(Debug, Default)]
struct DiscoveryState {
    /// Every claimed file path mapped to the executable path of its plugin.
    discovered: HashMap<PathBuf, PathBuf>,
    /// Resolved candidates in traversal order.
    candidates: Vec<PluginCandidate>,
    /// Canonical directories already walked, so symlink cycles terminate.
    visited_dirs: HashSet<PathBuf>,
}

/// A successful claim: the candidate plus every path it owns.
#[derive(Debug)]
struct Claim {
    candidate: PluginCandidate,
    claimed_paths: Vec<PathBuf>,
}

/// Outcome of running the analyzer list over one file.
#[derive(Debug)]
enum FileResolution {
    /// An analyzer recognized the file and it resolved to a plugin.
    Claimed(Box<Claim>),
    /// An analyzer recognized the file but it is malformed or points at
    /// nothing loadable. No further analyzers are consulted.
    Rejected,
    /// No analyzer recognized the file, or it was already claimed.
    Unclaimed,
}

/// Finds plugin candidates under a set of directories.
///
/// Analyzers are consulted in configured order; the first one to recognize
/// a file decides its fate.
pub struct PluginLocator {
    analyzers: Vec<Box<dyn PluginAnalyzer>>,
    search_places: Vec<PathBuf>,
    recursive: bool,
}

impl PluginLocator {
    /// Create a locator with the default analyzers: script analysis first,
    /// then `*.plugin.json` sidecars.
    pub fn new() -> Self {
        Self::with_analyzers(vec![
            Box::new(ScriptAnalyzer::new()),
            Box::new(InfoFileAnalyzer::default()),
        ])
    }

    /// Create a locator with exactly the given analyzers, in order.
    pub fn with_analyzers(analyzers: Vec<Box<dyn PluginAnalyzer>>) -> Self {
        Self {
            analyzers,
            search_places: Vec::new(),
            recursive: true,
        }
    }

    /// Replace the directories searched by [`collect`](Self::collect).
    pub fn set_search_places(&mut self, dirs: Vec<PathBuf>) {
        self.search_places = dirs;
    }

    /// Directories searched by [`collect`](Self::collect).
    pub fn search_places(&self) -> &[PathBuf] {
        &self.search_places
    }

    /// Whether [`collect`](Self::collect) descends into subdirectories.
    pub fn set_recursive(&mut self, recursive: bool) {
        self.recursive = recursive;
    }

    /// Current recursion setting.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Append an analyzer after the existing ones.
    pub fn append_analyzer(&mut self, analyzer: Box<dyn PluginAnalyzer>) {
        self.analyzers.push(analyzer);
    }

    /// Remove every analyzer called `name`. Returns how many were removed.
    pub fn remove_analyzers(&mut self, name: &str) -> usize {
        let before = self.analyzers.len();
        self.analyzers.retain(|a| a.name() != name);
        before - self.analyzers.len()
    }

    /// Names of the configured analyzers, in order.
    pub fn analyzer_names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Run discovery over the configured search places.
    pub fn collect(&self) -> (Vec<PluginCandidate>, usize) {
        self.locate(&self.search_places, self.recursive)
    }

    /// Run one discovery pass over `dirs`.
    ///
    /// Missing or non-directory entries are skipped. Output follows
    /// traversal order: directories in the given order, entries within a
    /// directory in OS listing order (files before subdirectories), except
    /// that a package entry point is analyzed before its siblings.
    pub fn locate(&self, dirs: &[PathBuf], recursive: bool) -> (Vec<PluginCandidate>, usize) {
        let mut state = DiscoveryState::default();

        for dir in dirs {
            let dir = absolutize(dir);
            if !dir.exists() {
                info!(dir = %dir.display(), "Plugin directory does not exist, skipping");
                continue;
            }
            if !dir.is_dir() {
                warn!(path = %dir.display(), "Plugin path is not a directory, skipping");
                continue;
            }

            self.walk(&dir, recursive, &mut state);
        }

        let count = state.candidates.len();
        (state.candidates, count)
    }

    fn walk(&self, dir: &Path, recursive: bool, state: &mut DiscoveryState) {
        if let Ok(canonical) = fs::canonicalize(dir) {
            if !state.visited_dirs.insert(canonical) {
                debug!(dir = %dir.display(), "Directory already walked, skipping");
                return;
            }
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read plugin directory");
                return;
            }
        };

        let mut files = Vec::new();
        let mut subdirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            // Follows symlinks.
            if path.is_dir() {
                subdirs.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }

        // A package entry point claims its siblings, so it goes first.
        if let Some(index) = files.iter().position(|f| is_package_entry_point(f)) {
            let entry_point = files.remove(index);
            files.insert(0, entry_point);
        }

        for file in files {
            match self.resolve_file(&file, state) {
                FileResolution::Claimed(claim) => {
                    let Claim {
                        candidate,
                        claimed_paths,
                    } = *claim;
                    info!(
                        plugin = %candidate.name(),
                        analyzer = %candidate.analyzer,
                        path = %candidate.executable_path.display(),
                        "Discovered plugin"
                    );
                    for path in claimed_paths {
                        state
                            .discovered
                            .insert(path, candidate.executable_path.clone());
                    }
                    state.candidates.push(candidate);
                }
                FileResolution::Rejected | FileResolution::Unclaimed => {}
            }
        }

        if recursive {
            for subdir in subdirs {
                self.walk(&subdir, recursive, state);
            }
        }
    }

    /// Run the analyzers over one file, stopping at the first that claims
    /// or rejects it.
    fn resolve_file(&self, file: &Path, state: &DiscoveryState) -> FileResolution {
        let (dir, filename) = match (file.parent(), file.file_name().and_then(|n| n.to_str())) {
            (Some(dir), Some(filename)) => (dir, filename),
            _ => return FileResolution::Unclaimed,
        };

        for analyzer in &self.analyzers {
            if !analyzer.is_valid_plugin(file) {
                continue;
            }
            if state.discovered.contains_key(file) {
                debug!(path = %file.display(), "File already claimed by a plugin");
                continue;
            }

            let analyzed = match analyzer.get_info(dir, filename) {
                Ok(analyzed) if analyzed.metadata.has_name() => analyzed,
                Ok(_) => {
                    warn!(
                        path = %file.display(),
                        analyzer = %analyzer.name(),
                        "Plugin declares no name, skipping"
                    );
                    return FileResolution::Rejected;
                }
                Err(e) => {
                    warn!(
                        path = %file.display(),
                        analyzer = %analyzer.name(),
                        error = %e,
                        "Failed to read plugin information, skipping"
                    );
                    return FileResolution::Rejected;
                }
            };

            let (executable_path, mut claimed_paths) = match resolve_candidate_path(&analyzed.path) {
                Some(resolved) => resolved,
                None => {
                    warn!(
                        path = %file.display(),
                        target = %analyzed.path.display(),
                        "Plugin candidate not found, skipping"
                    );
                    return FileResolution::Rejected;
                }
            };

            let module = module_file(&executable_path);
            if module != file && state.discovered.contains_key(&module) {
                debug!(
                    path = %file.display(),
                    module = %module.display(),
                    "Plugin module already claimed by another file"
                );
                continue;
            }
            // Members claimed earlier in the pass keep their first owner.
            claimed_paths.retain(|p| !state.discovered.contains_key(p));
            claimed_paths.push(file.to_path_buf());

            return FileResolution::Claimed(Box::new(Claim {
                candidate: PluginCandidate {
                    identity_path: file.to_path_buf(),
                    executable_path,
                    metadata: analyzed.metadata,
                    config: analyzed.config,
                    analyzer: analyzer.name().to_string(),
                },
                claimed_paths,
            }));
        }

        FileResolution::Unclaimed
    }
}

impl Default for PluginLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a declared plugin path into its executable module reference and
/// the module files it owns.
///
/// - A directory is a package: its `init` entry point is executed and every
///   `.rhai` file directly inside it is owned by the plugin.
/// - A `.rhai` file, or a path whose `.rhai` sibling exists, is a
///   single-file plugin.
/// - Anything else is unresolvable.
fn resolve_candidate_path(path: &Path) -> Option<(PathBuf, Vec<PathBuf>)> {
    if path.is_dir() {
        let executable = path.join(PACKAGE_ENTRY_POINT);
        let members = fs::read_dir(path)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|p| p.is_file() && has_script_suffix(p))
                    .collect()
            })
            .unwrap_or_default();
        return Some((executable, members));
    }

    if has_script_suffix(path) && path.is_file() {
        return Some((strip_script_suffix(path), vec![path.to_path_buf()]));
    }

    let with_suffix = module_file(path);
    if with_suffix.is_file() {
        return Some((path.to_path_buf(), vec![with_suffix]));
    }

    None
}

/// Make `dir` absolute against the working directory without resolving
/// symlinks.
fn absolutize(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(dir))
        .unwrap_or_else(|_| dir.to_path_buf())
}
