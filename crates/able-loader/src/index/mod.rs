//! Source indexing
//!
//! Walks a root's file tree and groups `.able` files into packages using a
//! lightweight pre-scan of their package declarations. No AST is built here.

use able_core::error::AbleError;
use able_core::types::Root;
use able_core::utils::name::{join_segments, sanitize_segment, SEGMENT_SEPARATOR};
use able_core::utils::path::utf8_path;
use able_parser::parser::strip_comment;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::LoaderResult;

/// Extension of Able source files
pub const SOURCE_EXTENSION: &str = "able";

/// Directory name whose subtree is never indexed
pub const QUARANTINE_DIR: &str = "quarantine";

/// Namespace base of kernel roots
pub const KERNEL_BASE: [&str; 2] = ["able", "kernel"];

/// Packages discovered under one root
#[derive(Debug, Clone)]
pub struct IndexedRoot {
    pub root: Root,
    /// Package name to its sorted files
    pub packages: BTreeMap<String, Vec<Utf8PathBuf>>,
    /// File to the package it was indexed under
    pub file_packages: BTreeMap<Utf8PathBuf, String>,
}

impl IndexedRoot {
    /// Check if the root contributed no packages
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Number of indexed source files
    pub fn file_count(&self) -> usize {
        self.file_packages.len()
    }

    /// Package the given file was indexed under
    pub fn package_for(&self, file: &Utf8Path) -> Option<&str> {
        self.file_packages.get(file).map(String::as_str)
    }
}

/// Groups a root's source files into packages
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceIndexer;

impl SourceIndexer {
    pub fn new() -> Self {
        Self
    }

    /// Index every source file under `root`, skipping quarantine subtrees
    pub fn index(&self, root: &Root) -> LoaderResult<IndexedRoot> {
        let mut packages: BTreeMap<String, Vec<Utf8PathBuf>> = BTreeMap::new();
        let mut file_packages = BTreeMap::new();

        let walker = WalkDir::new(&root.directory)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.depth() > 0
                    && entry.file_type().is_dir()
                    && entry.file_name() == QUARANTINE_DIR)
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let message = format!("Failed to walk {}", root.directory);
                AbleError::io(message, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = utf8_path(entry.into_path())?;
            if path.extension() != Some(SOURCE_EXTENSION) {
                continue;
            }

            let declared = scan_package_declaration(&path)?;
            let name = package_name(root, &path, declared.as_deref());
            packages.entry(name.clone()).or_default().push(path.clone());
            file_packages.insert(path, name);
        }

        for files in packages.values_mut() {
            files.sort();
            files.dedup();
        }

        debug!(
            "Indexed {} files into {} packages under {} ({})",
            file_packages.len(),
            packages.len(),
            root.directory,
            root.name
        );

        Ok(IndexedRoot {
            root: root.clone(),
            packages,
            file_packages,
        })
    }
}

/// Read a file and pre-scan it for an unqualified package declaration
pub fn scan_package_declaration(path: &Utf8Path) -> LoaderResult<Option<String>> {
    let source = fs::read_to_string(path)
        .map_err(|e| AbleError::io(format!("Failed to read {}", path), e))?;
    scan_declaration_source(path, &source)
}

/// Pre-scan source text for `[private] package <segment>;`.
///
/// A dotted segment is rejected; `package;` counts as no declaration.
pub fn scan_declaration_source(path: &Utf8Path, source: &str) -> LoaderResult<Option<String>> {
    for raw in source.lines() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        let line = strip_token(line, "private").map(str::trim_start).unwrap_or(line);
        let Some(rest) = strip_token(line, "package") else {
            continue;
        };
        let name = rest.trim();
        let name = name.strip_suffix(';').unwrap_or(name).trim();
        if name.is_empty() {
            return Ok(None);
        }
        if name.contains(SEGMENT_SEPARATOR) {
            return Err(AbleError::QualifiedPackageDeclaration {
                path: path.to_path_buf(),
            });
        }
        return Ok(Some(name.to_string()));
    }
    Ok(None)
}

/// Package name segments for a file under `root`
pub fn package_segments(root: &Root, file: &Utf8Path, declared: Option<&str>) -> Vec<String> {
    let mut segments: Vec<String> = if root.is_kernel() {
        KERNEL_BASE.iter().map(|s| s.to_string()).collect()
    } else {
        vec![root.name.clone()]
    };

    let dir = file.parent().unwrap_or(file);
    if let Ok(relative) = dir.strip_prefix(&root.directory) {
        for component in relative.components() {
            if let Utf8Component::Normal(part) = component {
                let segment = sanitize_segment(part);
                if !segment.is_empty() {
                    segments.push(segment);
                }
            }
        }
    }

    if let Some(declared) = declared.map(sanitize_segment).filter(|s| !s.is_empty()) {
        segments.push(declared);
    }
    segments
}

/// Fully qualified package name for a file under `root`
pub fn package_name(root: &Root, file: &Utf8Path, declared: Option<&str>) -> String {
    join_segments(&package_segments(root, file, declared))
}

fn strip_token<'a>(line: &'a str, token: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(token)?;
    match rest.chars().next() {
        None | Some(';') => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        _ => None,
    }
}
