//! Package root discovery
//!
//! A root is found by walking upward from a file for a `package.yml`
//! manifest. Only the manifest's scalar keys are read, through a permissive
//! line scan; full manifest parsing belongs to the manifest loader.

use able_core::error::AbleError;
use able_core::types::{Root, RootKind, SearchPath};
use able_core::utils::name::sanitize_segment;
use able_core::utils::path::{absolute_path, paths_overlap};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

use crate::LoaderResult;

/// Manifest file name at a package root
pub const MANIFEST_FILE: &str = "package.yml";

/// Root name used when a search path yields no usable name
pub const FALLBACK_ROOT_NAME: &str = "pkg";

/// Locates and classifies package roots
#[derive(Debug, Clone, Copy)]
pub struct RootResolver<'a> {
    search_paths: &'a [SearchPath],
}

impl<'a> RootResolver<'a> {
    /// Create a resolver aware of the configured search roots
    pub fn new(search_paths: &'a [SearchPath]) -> Self {
        Self { search_paths }
    }

    /// Discover and classify the root that owns an entry file.
    ///
    /// The entry root is promoted to stdlib when it overlaps a configured
    /// stdlib search root.
    pub fn entry_root(&self, entry: &Utf8Path) -> LoaderResult<Root> {
        let (directory, name) = discover_root(entry)?;
        let mut root = Root::classified(directory, name);
        if !root.kind.is_stdlib()
            && self
                .search_paths
                .iter()
                .any(|sp| sp.kind.is_stdlib() && paths_overlap(&sp.path, &root.directory))
        {
            debug!("Promoting {} to stdlib: overlaps a stdlib search root", root.directory);
            root.kind = RootKind::Stdlib;
        }
        Ok(root)
    }
}

/// Walk upward from a file's directory looking for a manifest.
///
/// Falls back to the file's own directory, named after its basename, when
/// no manifest exists up to the filesystem root.
pub fn discover_root(file: &Utf8Path) -> LoaderResult<(Utf8PathBuf, String)> {
    let start = file.parent().unwrap_or(file);
    for dir in start.ancestors() {
        let manifest = dir.join(MANIFEST_FILE);
        if !manifest.is_file() {
            continue;
        }
        let name = read_manifest_name(&manifest)?
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AbleError::RootDiscovery {
                path: manifest.clone(),
                reason: format!("{} is missing a name", MANIFEST_FILE),
            })?;
        debug!("Found manifest {} declaring '{}'", manifest, name);
        return Ok((dir.to_path_buf(), sanitize_segment(&name)));
    }

    let name = sanitize_segment(start.file_name().unwrap_or_default());
    debug!("No manifest above {}, using directory name '{}'", file, name);
    Ok((start.to_path_buf(), name))
}

/// Discover the root for an explicitly configured search path.
///
/// The path must be an existing directory. Without a manifest name the
/// directory basename is used, or `pkg` when that sanitizes to nothing.
pub fn discover_root_for_path(path: &Utf8Path) -> LoaderResult<(Utf8PathBuf, String)> {
    if path.as_str().is_empty() {
        return Err(AbleError::InvalidSearchPath {
            path: String::new(),
            reason: "empty search path".to_string(),
        });
    }
    let abs = absolute_path(path)?;
    let metadata = fs::metadata(&abs).map_err(|e| AbleError::InvalidSearchPath {
        path: abs.to_string(),
        reason: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(AbleError::InvalidSearchPath {
            path: abs.to_string(),
            reason: "not a directory".to_string(),
        });
    }

    let name = match find_manifest_name(&abs)? {
        Some(name) if !name.is_empty() => sanitize_segment(&name),
        _ => {
            let base = sanitize_segment(abs.file_name().unwrap_or_default());
            if base.is_empty() {
                FALLBACK_ROOT_NAME.to_string()
            } else {
                base
            }
        },
    };
    Ok((abs, name))
}

/// Find the nearest manifest at or above `start` and read its name
pub fn find_manifest_name(start: &Utf8Path) -> LoaderResult<Option<String>> {
    match find_manifest(start) {
        Some(manifest) => read_manifest_name(&manifest),
        None => Ok(None),
    }
}

/// Nearest manifest at or above `start`
pub fn find_manifest(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_FILE))
        .find(|candidate| candidate.is_file())
}

/// Read the `name:` key of a manifest
pub fn read_manifest_name(path: &Utf8Path) -> LoaderResult<Option<String>> {
    read_manifest_field(path, "name")
}

/// Read a scalar key from a manifest with a permissive line scan.
///
/// Blank lines and `#` comments are skipped; surrounding quotes are removed.
pub fn read_manifest_field(path: &Utf8Path, key: &str) -> LoaderResult<Option<String>> {
    let data = fs::read_to_string(path).map_err(|e| AbleError::RootDiscovery {
        path: path.to_path_buf(),
        reason: format!("failed to read {}: {}", MANIFEST_FILE, e),
    })?;
    Ok(scan_manifest_field(&data, key))
}

/// Scan manifest text for a scalar key
pub fn scan_manifest_field(data: &str, key: &str) -> Option<String> {
    let prefix = format!("{}:", key);
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
}
