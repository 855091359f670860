//! Search path layering and environment overrides
//!
//! Roots are collected in precedence order: explicit `--search-path` flags,
//! explicit `--stdlib-path` flags, the entry directory and working directory
//! when enabled, `ABLE_PATH`, `ABLE_MODULE_PATHS`, then bundled kernel and
//! stdlib checkouts found above the entry directory.

use able_core::types::{RootKind, SearchPath};
use able_core::utils::path::{absolute_path, looks_like_kernel_path, looks_like_stdlib_path, utf8_path};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{HashMap, HashSet};
use std::env;
use tracing::{debug, warn};

use crate::ConfigResult;

/// User search roots, separated by the platform path-list separator
pub const ABLE_PATH_ENV: &str = "ABLE_PATH";

/// Additional module roots, same format as `ABLE_PATH`
pub const ABLE_MODULE_PATHS_ENV: &str = "ABLE_MODULE_PATHS";

/// Bundled kernel checkouts, relative to each ancestor directory
const KERNEL_CANDIDATES: [&str; 3] = ["kernel/src", "ablekernel/src", "able_kernel/src"];

/// Bundled stdlib checkouts, relative to each ancestor directory
const STDLIB_CANDIDATES: [&str; 3] = ["stdlib/src", "able-stdlib/src", "able_stdlib/src"];

/// Assembles loader search roots from all configuration layers
#[derive(Debug, Clone)]
pub struct SearchPathCollector {
    search_paths: Vec<Utf8PathBuf>,
    stdlib_paths: Vec<Utf8PathBuf>,
    env_overrides: HashMap<String, String>,
    base: Option<Utf8PathBuf>,
    cwd: Option<Utf8PathBuf>,
    bundled: bool,
}

impl SearchPathCollector {
    /// Create a collector with no layers and bundled discovery enabled
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            stdlib_paths: Vec::new(),
            env_overrides: HashMap::new(),
            base: None,
            cwd: None,
            bundled: true,
        }
    }

    /// Explicit user search roots (highest precedence)
    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.search_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Explicit stdlib search roots
    pub fn with_stdlib_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.stdlib_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Use the given environment values instead of the process environment
    pub fn with_env(mut self, overrides: HashMap<String, String>) -> Self {
        self.env_overrides = overrides;
        self
    }

    /// Read `ABLE_PATH` and `ABLE_MODULE_PATHS` from the process environment
    pub fn with_process_env(self) -> Self {
        let overrides = Self::collect_env_overrides();
        self.with_env(overrides)
    }

    /// Directory where bundled discovery starts, normally the entry's
    pub fn with_base<P: Into<Utf8PathBuf>>(mut self, base: P) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Also search the entry directory and `cwd` as user roots
    pub fn with_cwd<P: Into<Utf8PathBuf>>(mut self, cwd: P) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Disable bundled kernel/stdlib discovery
    pub fn without_bundled(mut self) -> Self {
        self.bundled = false;
        self
    }

    /// Collect search-path environment variables
    pub fn collect_env_overrides() -> HashMap<String, String> {
        [ABLE_PATH_ENV, ABLE_MODULE_PATHS_ENV]
            .into_iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect()
    }

    /// Produce the search roots in precedence order.
    ///
    /// Paths are made absolute and deduplicated; anything that is not an
    /// existing directory is dropped.
    pub fn collect(&self) -> ConfigResult<Vec<SearchPath>> {
        let mut layers = PathLayers::default();

        for path in &self.search_paths {
            layers.add(path, RootKind::User, true)?;
        }
        for path in &self.stdlib_paths {
            layers.add(path, RootKind::Stdlib, true)?;
        }
        if let Some(cwd) = &self.cwd {
            if let Some(base) = &self.base {
                layers.add(base, RootKind::User, false)?;
            }
            layers.add(cwd, RootKind::User, false)?;
        }
        for key in [ABLE_PATH_ENV, ABLE_MODULE_PATHS_ENV] {
            if let Some(value) = self.env_overrides.get(key) {
                for path in split_path_list(value)? {
                    layers.add(&path, RootKind::User, false)?;
                }
            }
        }

        if self.bundled {
            for start in self.discovery_starts()? {
                for path in find_bundled_roots(&start, &KERNEL_CANDIDATES) {
                    layers.add(&path, RootKind::Stdlib, false)?;
                }
                for path in find_bundled_roots(&start, &STDLIB_CANDIDATES) {
                    layers.add(&path, RootKind::Stdlib, false)?;
                }
            }
        }

        debug!("Collected {} search roots", layers.paths.len());
        Ok(layers.paths)
    }

    fn discovery_starts(&self) -> ConfigResult<Vec<Utf8PathBuf>> {
        let mut starts = Vec::new();
        if let Some(base) = &self.base {
            starts.push(absolute_path(base)?);
        }
        // Installed builds ship the kernel next to the binary
        if let Some(dir) = env::current_exe().ok().and_then(|exe| exe.parent().map(|p| p.to_path_buf())) {
            if let Ok(dir) = utf8_path(dir) {
                starts.push(dir);
            }
        }
        Ok(starts)
    }
}

impl Default for SearchPathCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct PathLayers {
    seen: HashSet<Utf8PathBuf>,
    paths: Vec<SearchPath>,
}

impl PathLayers {
    fn add(&mut self, path: &Utf8Path, kind: RootKind, explicit: bool) -> ConfigResult<()> {
        if path.as_str().trim().is_empty() {
            return Ok(());
        }
        let abs = absolute_path(path)?;
        if !abs.is_dir() {
            if explicit {
                warn!("Ignoring search path {}: not a directory", abs);
            } else {
                debug!("Ignoring search path {}: not a directory", abs);
            }
            return Ok(());
        }
        if !self.seen.insert(abs.clone()) {
            return Ok(());
        }
        let kind = if looks_like_stdlib_path(&abs) || looks_like_kernel_path(&abs) {
            RootKind::Stdlib
        } else {
            kind
        };
        self.paths.push(SearchPath { path: abs, kind });
        Ok(())
    }
}

/// Split a path-list value on the platform separator, dropping blanks
pub fn split_path_list(value: &str) -> ConfigResult<Vec<Utf8PathBuf>> {
    env::split_paths(value)
        .filter(|path| !path.as_os_str().is_empty())
        .map(utf8_path)
        .collect::<ConfigResult<Vec<_>>>()
        .map(|paths| {
            paths
                .into_iter()
                .filter(|path| !path.as_str().trim().is_empty())
                .map(|path| Utf8PathBuf::from(path.as_str().trim()))
                .collect()
        })
}

/// Find bundled checkouts at or above `start`, nearest first
pub fn find_bundled_roots(start: &Utf8Path, candidates: &[&str]) -> Vec<Utf8PathBuf> {
    start
        .ancestors()
        .flat_map(|dir| candidates.iter().map(move |candidate| dir.join(candidate)))
        .filter(|candidate| candidate.is_dir())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base_dir(temp_dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp_dir.path().canonicalize().unwrap()).unwrap()
    }

    fn mkdir(base: &Utf8Path, relative: &str) -> Utf8PathBuf {
        let path = base.join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn test_precedence_and_kinds() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = base_dir(&temp_dir);
        let user = mkdir(&base, "libs/user");
        let std = mkdir(&base, "libs/corelib");
        let from_env = mkdir(&base, "env/one");
        let module_env = mkdir(&base, "env/able_stdlib");

        let separator = if cfg!(windows) { ";" } else { ":" };
        let env = HashMap::from([
            (ABLE_PATH_ENV.to_string(), format!("{}{} {}", from_env, separator, separator)),
            (ABLE_MODULE_PATHS_ENV.to_string(), module_env.to_string()),
        ]);

        let paths = SearchPathCollector::new()
            .with_search_paths([user.clone()])
            .with_stdlib_paths([std.clone()])
            .with_env(env)
            .without_bundled()
            .collect()
            .unwrap();

        assert_eq!(
            paths,
            vec![
                SearchPath::user(user),
                SearchPath::stdlib(std),
                SearchPath::user(from_env),
                SearchPath::stdlib(module_env),
            ]
        );
    }

    #[test]
    fn test_deduplicates_and_skips_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = base_dir(&temp_dir);
        let lib = mkdir(&base, "lib");
        fs::write(base.join("file.able"), "").unwrap();

        let paths = SearchPathCollector::new()
            .with_search_paths([lib.clone(), lib.join("."), base.join("missing"), base.join("file.able")])
            .with_stdlib_paths([lib.clone()])
            .without_bundled()
            .collect()
            .unwrap();

        assert_eq!(paths, vec![SearchPath::user(lib)]);
    }

    #[test]
    fn test_working_directories_are_opt_in() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = base_dir(&temp_dir);
        let explicit = mkdir(&base, "libs/one");
        let entry_dir = mkdir(&base, "app");
        let cwd = mkdir(&base, "work");
        let from_env = mkdir(&base, "env/one");
        let env = HashMap::from([(ABLE_PATH_ENV.to_string(), from_env.to_string())]);

        let collector = SearchPathCollector::new()
            .with_search_paths([explicit.clone()])
            .with_env(env)
            .with_base(entry_dir.clone())
            .without_bundled();

        let default_paths = collector.clone().collect().unwrap();
        assert_eq!(default_paths, vec![SearchPath::user(explicit.clone()), SearchPath::user(from_env.clone())]);

        let paths = collector.with_cwd(cwd.clone()).collect().unwrap();
        assert_eq!(
            paths,
            vec![
                SearchPath::user(explicit),
                SearchPath::user(entry_dir),
                SearchPath::user(cwd),
                SearchPath::user(from_env),
            ]
        );
    }

    #[test]
    fn test_bundled_discovery_walks_upward() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = base_dir(&temp_dir);
        let kernel = mkdir(&base, "kernel/src");
        let stdlib = mkdir(&base, "stdlib/src");
        let entry_dir = mkdir(&base, "app/src/nested");

        let paths = SearchPathCollector::new().with_base(entry_dir).collect().unwrap();

        let kernel_pos = paths.iter().position(|p| p.path == kernel).unwrap();
        let stdlib_pos = paths.iter().position(|p| p.path == stdlib).unwrap();
        assert!(kernel_pos < stdlib_pos);
        assert!(paths.iter().all(|p| p.kind == RootKind::Stdlib));

        let disabled = SearchPathCollector::new()
            .with_base(base.join("app"))
            .without_bundled()
            .collect()
            .unwrap();
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_find_bundled_roots_nearest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = base_dir(&temp_dir);
        let outer = mkdir(&base, "kernel/src");
        let inner = mkdir(&base, "work/able_kernel/src");

        let found = find_bundled_roots(&base.join("work"), &KERNEL_CANDIDATES);
        let inner_pos = found.iter().position(|p| *p == inner).unwrap();
        let outer_pos = found.iter().position(|p| *p == outer).unwrap();
        assert!(inner_pos < outer_pos);
    }

    #[test]
    fn test_split_path_list() {
        let separator = if cfg!(windows) { ";" } else { ":" };
        let value = format!("/a{}{}/b{} ", separator, separator, separator);
        let parts = split_path_list(&value).unwrap();
        assert_eq!(parts, vec![Utf8PathBuf::from("/a"), Utf8PathBuf::from("/b")]);
        assert!(split_path_list("").unwrap().is_empty());
    }
}
