//! Resolved packages and the program they form

use able_core::types::PackageOrigin;
use able_parser::ast::{NodeId, SourceModule};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// How one package refers to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// `import`, must resolve
    Static,
    /// `dynimport`, resolved when available
    Dynamic,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Static => write!(f, "static"),
            ImportKind::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// One merged package
#[derive(Debug, Clone)]
pub struct Module {
    /// Fully qualified package name
    pub name: String,
    /// Merged syntax tree
    pub ast: SourceModule,
    /// Sorted source files
    pub files: Vec<Utf8PathBuf>,
    /// Sorted statically imported package names, self excluded
    pub imports: Vec<String>,
    /// Sorted dynamically imported package names, self excluded
    pub dyn_imports: Vec<String>,
    /// Source file of every node in `ast`
    pub node_origins: BTreeMap<NodeId, Utf8PathBuf>,
    /// Root that provided the package
    pub origin: PackageOrigin,
}

impl Module {
    /// File a node came from
    pub fn origin_of(&self, node: NodeId) -> Option<&Utf8Path> {
        self.node_origins.get(&node).map(Utf8PathBuf::as_path)
    }

    /// Check if the package is declared `private`
    pub fn is_private(&self) -> bool {
        self.ast.package.as_ref().is_some_and(|p| p.is_private)
    }
}

/// Dependency-ordered set of packages reachable from an entry file
#[derive(Debug, Clone)]
pub struct Program {
    pub entry: Arc<Module>,
    /// Dependencies before dependents
    pub modules: Vec<Arc<Module>>,
}

impl Program {
    /// Look up a module by package name
    pub fn module(&self, name: &str) -> Option<&Arc<Module>> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Package names in load order
    pub fn package_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Total number of source files across all modules
    pub fn file_count(&self) -> usize {
        self.modules.iter().map(|m| m.files.len()).sum()
    }

    /// Serializable overview for reporting
    pub fn summary(&self) -> ProgramSummary {
        ProgramSummary {
            entry: self.entry.name.clone(),
            modules: self
                .modules
                .iter()
                .map(|m| ModuleSummary {
                    name: m.name.clone(),
                    root: m.origin.root_directory.clone(),
                    kind: m.origin.kind.to_string(),
                    private: m.is_private(),
                    files: m.files.clone(),
                    imports: m.imports.clone(),
                    dyn_imports: m.dyn_imports.clone(),
                })
                .collect(),
        }
    }
}

/// Report form of a [`Program`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramSummary {
    pub entry: String,
    pub modules: Vec<ModuleSummary>,
}

/// Report form of a [`Module`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub name: String,
    pub root: Utf8PathBuf,
    pub kind: String,
    pub private: bool,
    pub files: Vec<Utf8PathBuf>,
    pub imports: Vec<String>,
    pub dyn_imports: Vec<String>,
}
