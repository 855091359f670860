//! Syntax tree for Able source modules
//!
//! Nodes are identified by [`NodeId`] handles rather than by address. A
//! handle pairs the [`FileId`] the node was created for with a counter local
//! to that file, so ids stay stable across runs and across merges.

use std::collections::BTreeSet;
use std::fmt;

/// Identifier of one parsed source (or one synthetic merge unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Stable handle of a syntax node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub file: FileId,
    pub local: u32,
}

/// Allocator handing out node ids for one file
#[derive(Debug)]
pub struct NodeIds {
    file: FileId,
    next: u32,
}

/// Identifier with its node handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub id: NodeId,
    pub name: String,
}

/// `[private] package <name>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStatement {
    pub id: NodeId,
    pub name_path: Vec<Identifier>,
    pub is_private: bool,
}

/// `Name [as Alias]` inside an import selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSelector {
    pub id: NodeId,
    pub name: Identifier,
    pub alias: Option<Identifier>,
}

/// An `import` or `dynimport` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub id: NodeId,
    pub package_path: Vec<Identifier>,
    pub is_wildcard: bool,
    pub selectors: Vec<ImportSelector>,
    pub alias: Option<Identifier>,
    pub line: usize,
}

/// A statement the loader does not interpret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueStatement {
    pub id: NodeId,
    pub text: String,
    pub line: usize,
}

/// A brace-delimited block: `header { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: NodeId,
    pub header: String,
    pub body: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    DynImport(ImportStatement),
    Block(Block),
    Opaque(OpaqueStatement),
}

/// A parsed source file, or the merge of several
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    pub id: NodeId,
    pub package: Option<PackageStatement>,
    pub imports: Vec<ImportStatement>,
    pub body: Vec<Statement>,
}

impl NodeIds {
    /// Start allocating ids for `file`
    pub fn new(file: FileId) -> Self {
        Self { file, next: 0 }
    }

    /// Allocate the next id
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId {
            file: self.file,
            local: self.next,
        };
        self.next += 1;
        id
    }

    /// Allocate an identifier node
    pub fn ident(&mut self, name: impl Into<String>) -> Identifier {
        Identifier {
            id: self.next_id(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.file.0, self.local)
    }
}

/// Join identifier names with `.`, skipping empty names
pub fn join_identifiers(ids: &[Identifier]) -> String {
    ids.iter()
        .map(|id| id.name.as_str())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

impl PackageStatement {
    /// Build a package statement from plain segments
    pub fn from_segments<S: AsRef<str>>(ids: &mut NodeIds, segments: &[S], is_private: bool) -> Self {
        let id = ids.next_id();
        let name_path = segments
            .iter()
            .map(AsRef::as_ref)
            .filter(|s| !s.is_empty())
            .map(|s| ids.ident(s))
            .collect();
        Self {
            id,
            name_path,
            is_private,
        }
    }

    /// Dotted name as written
    pub fn name(&self) -> String {
        join_identifiers(&self.name_path)
    }

    /// Declared segments as plain strings
    pub fn segments(&self) -> Vec<String> {
        self.name_path
            .iter()
            .filter(|id| !id.name.is_empty())
            .map(|id| id.name.clone())
            .collect()
    }
}

impl ImportStatement {
    /// Dotted name of the imported package
    pub fn package_name(&self) -> String {
        join_identifiers(&self.package_path)
    }

    /// Normalized key used to detect duplicate imports:
    /// path, wildcard flag, alias and selectors with their aliases.
    pub fn key(&self) -> String {
        let mut key = self.package_name();
        key.push('|');
        if self.is_wildcard {
            key.push('*');
        }
        key.push('|');
        if let Some(alias) = &self.alias {
            key.push_str(&alias.name);
        }
        if !self.selectors.is_empty() {
            key.push('|');
            for selector in &self.selectors {
                key.push_str(&selector.name.name);
                if let Some(alias) = &selector.alias {
                    key.push_str(" as ");
                    key.push_str(&alias.name);
                }
                key.push(',');
            }
        }
        key
    }

    fn visit_ids(&self, visit: &mut dyn FnMut(NodeId)) {
        visit(self.id);
        for ident in &self.package_path {
            visit(ident.id);
        }
        for selector in &self.selectors {
            visit(selector.id);
            visit(selector.name.id);
            if let Some(alias) = &selector.alias {
                visit(alias.id);
            }
        }
        if let Some(alias) = &self.alias {
            visit(alias.id);
        }
    }
}

impl Statement {
    /// Handle of the statement node itself
    pub fn id(&self) -> NodeId {
        match self {
            Statement::DynImport(import) => import.id,
            Statement::Block(block) => block.id,
            Statement::Opaque(stmt) => stmt.id,
        }
    }

    fn visit_ids(&self, visit: &mut dyn FnMut(NodeId)) {
        match self {
            Statement::DynImport(import) => import.visit_ids(visit),
            Statement::Block(block) => {
                visit(block.id);
                for stmt in &block.body {
                    stmt.visit_ids(visit);
                }
            },
            Statement::Opaque(stmt) => visit(stmt.id),
        }
    }

    fn collect_dyn_imports<'a>(&'a self, into: &mut Vec<&'a ImportStatement>) {
        match self {
            Statement::DynImport(import) => into.push(import),
            Statement::Block(block) => {
                for stmt in &block.body {
                    stmt.collect_dyn_imports(into);
                }
            },
            Statement::Opaque(_) => {},
        }
    }
}

impl SourceModule {
    /// Visit the handle of every node in the tree, root first
    pub fn visit_ids(&self, visit: &mut dyn FnMut(NodeId)) {
        visit(self.id);
        if let Some(package) = &self.package {
            visit(package.id);
            for ident in &package.name_path {
                visit(ident.id);
            }
        }
        for import in &self.imports {
            import.visit_ids(visit);
        }
        for stmt in &self.body {
            stmt.visit_ids(visit);
        }
    }

    /// Handles of every node in the tree
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.visit_ids(&mut |id| ids.push(id));
        ids
    }

    /// Every `dynimport` statement, including those nested in blocks
    pub fn dyn_imports(&self) -> Vec<&ImportStatement> {
        let mut found = Vec::new();
        for stmt in &self.body {
            stmt.collect_dyn_imports(&mut found);
        }
        found
    }

    /// Sorted names of statically imported packages
    pub fn import_names(&self) -> BTreeSet<String> {
        self.imports
            .iter()
            .map(ImportStatement::package_name)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Sorted names of dynamically imported packages
    pub fn dyn_import_names(&self) -> BTreeSet<String> {
        self.dyn_imports()
            .into_iter()
            .map(ImportStatement::package_name)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(ids: &mut NodeIds, path: &[&str], alias: Option<&str>) -> ImportStatement {
        ImportStatement {
            id: ids.next_id(),
            package_path: path.iter().map(|p| ids.ident(*p)).collect(),
            is_wildcard: false,
            selectors: Vec::new(),
            alias: alias.map(|a| ids.ident(a)),
            line: 1,
        }
    }

    #[test]
    fn test_node_ids_are_sequential_per_file() {
        let mut ids = NodeIds::new(FileId(7));
        let first = ids.next_id();
        let second = ids.next_id();
        assert_eq!(first, NodeId { file: FileId(7), local: 0 });
        assert_eq!(second.local, 1);
        assert_eq!(second.to_string(), "#7:1");
    }

    #[test]
    fn test_import_key_distinguishes_alias() {
        let mut ids = NodeIds::new(FileId(0));
        let plain = import(&mut ids, &["a", "b"], None);
        let aliased = import(&mut ids, &["a", "b"], Some("ab"));
        let again = import(&mut ids, &["a", "b"], None);
        assert_ne!(plain.key(), aliased.key());
        assert_eq!(plain.key(), again.key());
        assert_eq!(plain.package_name(), "a.b");
    }

    #[test]
    fn test_visit_ids_covers_nested_blocks() {
        let mut ids = NodeIds::new(FileId(1));
        let module_id = ids.next_id();
        let dyn_import = import(&mut ids, &["q"], None);
        let inner = Statement::DynImport(dyn_import);
        let block = Statement::Block(Block {
            id: ids.next_id(),
            header: "fn main()".to_string(),
            body: vec![inner],
            line: 1,
        });
        let module = SourceModule {
            id: module_id,
            package: Some(PackageStatement::from_segments(&mut ids, &["p"], false)),
            imports: Vec::new(),
            body: vec![block],
        };

        let all = module.node_ids();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], module_id);
        assert_eq!(module.dyn_import_names().into_iter().collect::<Vec<_>>(), vec!["q"]);
        assert_eq!(module.package.as_ref().map(PackageStatement::name), Some("p".to_string()));
    }
}
