//! Namespace policy
//!
//! Tracks which root first registered each package name and rejects a second
//! root that produces the same name.

use able_core::error::AbleError;
use able_core::types::{PackageOrigin, Root};
use camino::Utf8PathBuf;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::index::IndexedRoot;
use crate::LoaderResult;

/// Files of one fully qualified package and the root that provided them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLocation {
    pub root: Root,
    pub files: Vec<Utf8PathBuf>,
}

/// Package name to its location
pub type PackageIndex = BTreeMap<String, PackageLocation>;

/// Registry of package names and their origins for one load session
#[derive(Debug, Default)]
pub struct NamespaceAuthority {
    index: PackageIndex,
    origins: BTreeMap<String, PackageOrigin>,
}

impl NamespaceAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a root may contribute packages.
    ///
    /// Currently permits every root, the reserved `able` name included.
    pub fn ensure_namespace_allowed(&self, root: &Root) -> LoaderResult<bool> {
        debug!("Namespace check for root {} ({}): allowed", root.name, root.kind);
        Ok(true)
    }

    /// Register every package of an indexed root.
    ///
    /// The same origin registering a name again is a no-op; a different
    /// origin is a conflict.
    pub fn register(&mut self, indexed: IndexedRoot) -> LoaderResult<()> {
        let origin = indexed.root.origin();
        for (name, files) in indexed.packages {
            if files.is_empty() {
                continue;
            }
            if let Some(existing) = self.origins.get(&name) {
                if *existing != origin {
                    return Err(AbleError::PackageConflict {
                        name,
                        first_root: existing.root_directory.clone(),
                        second_root: origin.root_directory.clone(),
                    });
                }
                continue;
            }
            self.origins.insert(name.clone(), origin.clone());
            self.index.insert(
                name,
                PackageLocation {
                    root: indexed.root.clone(),
                    files,
                },
            );
        }
        Ok(())
    }

    /// Names of every package whose origin is a kernel root
    pub fn kernel_packages(&self) -> BTreeSet<String> {
        self.origins
            .iter()
            .filter(|(_, origin)| origin.is_kernel())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Look up a registered package
    pub fn location(&self, name: &str) -> Option<&PackageLocation> {
        self.index.get(name)
    }

    /// Origin that first registered a package
    pub fn origin(&self, name: &str) -> Option<&PackageOrigin> {
        self.origins.get(name)
    }

    /// Check if a package is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Hand the finished index to a load session
    pub fn into_index(self) -> PackageIndex {
        self.index
    }
}
