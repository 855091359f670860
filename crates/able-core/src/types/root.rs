//! Package root types.
//!
//! A root is a directory subtree that forms one namespace base. Its kind is
//! derived from its name and path, never declared.

use crate::utils::path::{looks_like_kernel_path, looks_like_stdlib_path};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name reserved for the standard library root
pub const STDLIB_ROOT_NAME: &str = "able";

/// Name that marks a kernel root
pub const KERNEL_ROOT_NAME: &str = "kernel";

/// Classification of a package root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    /// User code
    User,
    /// Standard library (kernel roots are a stdlib sub-kind)
    Stdlib,
}

/// A discovered package root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Root {
    pub directory: Utf8PathBuf,
    pub name: String,
    pub kind: RootKind,
}

/// Configured extra search root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchPath {
    pub path: Utf8PathBuf,
    pub kind: RootKind,
}

/// Root that first registered a package name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageOrigin {
    pub root_directory: Utf8PathBuf,
    pub root_name: String,
    pub kind: RootKind,
}

impl RootKind {
    /// Classify a root from its name and directory markers
    pub fn classify(name: &str, directory: &Utf8Path) -> Self {
        if name == STDLIB_ROOT_NAME
            || looks_like_stdlib_path(directory)
            || looks_like_kernel_path(directory)
        {
            RootKind::Stdlib
        } else {
            RootKind::User
        }
    }

    /// Check if this is the standard library kind
    pub fn is_stdlib(&self) -> bool {
        matches!(self, RootKind::Stdlib)
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootKind::User => write!(f, "user"),
            RootKind::Stdlib => write!(f, "stdlib"),
        }
    }
}

impl Root {
    /// Create a root with an explicit kind
    pub fn new(directory: Utf8PathBuf, name: String, kind: RootKind) -> Self {
        Self {
            directory,
            name,
            kind,
        }
    }

    /// Create a root whose kind is derived from its name and path
    pub fn classified(directory: Utf8PathBuf, name: String) -> Self {
        let kind = RootKind::classify(&name, &directory);
        Self::new(directory, name, kind)
    }

    /// Kernel roots always index under `able.kernel.*`
    pub fn is_kernel(&self) -> bool {
        is_kernel_root(&self.name, &self.directory)
    }

    /// Origin record used when registering this root's packages
    pub fn origin(&self) -> PackageOrigin {
        PackageOrigin {
            root_directory: self.directory.clone(),
            root_name: self.name.clone(),
            kind: self.kind,
        }
    }
}

impl SearchPath {
    /// Create a user search path
    pub fn user<P: Into<Utf8PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            kind: RootKind::User,
        }
    }

    /// Create a standard library search path
    pub fn stdlib<P: Into<Utf8PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            kind: RootKind::Stdlib,
        }
    }
}

impl PackageOrigin {
    /// Check if packages from this origin are always linked
    pub fn is_kernel(&self) -> bool {
        is_kernel_root(&self.root_name, &self.root_directory)
    }
}

fn is_kernel_root(name: &str, directory: &Utf8Path) -> bool {
    name == KERNEL_ROOT_NAME || looks_like_kernel_path(directory)
}
