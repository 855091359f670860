//! Import graph of a loaded program using petgraph
//!
//! Nodes are package names and edges point from a dependent package to the
//! package it imports, weighted by the kind of import.

use able_core::error::AbleError;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use crate::program::{ImportKind, Program};
use crate::LoaderResult;

/// Directed import graph
#[derive(Debug, Clone)]
pub struct ImportGraph {
    /// Underlying directed graph
    graph: DiGraph<String, ImportKind>,
    /// Package name to node for fast lookups
    node_map: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    /// Create a new empty import graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Build the graph of a program, keeping only edges between loaded
    /// packages
    pub fn from_program(program: &Program) -> Self {
        let mut graph = Self::new();
        for module in &program.modules {
            graph.add_package(&module.name);
        }
        for module in &program.modules {
            let edges = module
                .imports
                .iter()
                .map(|dep| (dep, ImportKind::Static))
                .chain(module.dyn_imports.iter().map(|dep| (dep, ImportKind::Dynamic)));
            for (dep, kind) in edges {
                // Unresolved dynamic imports have no node
                let from = graph.node_map.get(&module.name).copied();
                let to = graph.node_map.get(dep).copied();
                if let (Some(from), Some(to)) = (from, to) {
                    graph.connect(from, to, kind);
                }
            }
        }
        graph
    }

    /// Add a package node, returning the existing node when present
    pub fn add_package(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.node_map.get(name) {
            return *index;
        }
        let index = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), index);
        index
    }

    /// Add an import edge between two known packages
    pub fn add_dependency(&mut self, from: &str, to: &str, kind: ImportKind) -> LoaderResult<()> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;
        self.connect(from_index, to_index, kind);
        Ok(())
    }

    fn connect(&mut self, from: NodeIndex, to: NodeIndex, kind: ImportKind) {
        if !self
            .graph
            .edges_connecting(from, to)
            .any(|edge| *edge.weight() == kind)
        {
            self.graph.add_edge(from, to, kind);
        }
    }

    fn index_of(&self, name: &str) -> LoaderResult<NodeIndex> {
        self.node_map
            .get(name)
            .copied()
            .ok_or_else(|| AbleError::PackageNotFound {
                name: name.to_string(),
            })
    }

    /// Check if a package is in the graph
    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Get number of packages in the graph
    pub fn package_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get number of import edges in the graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Sorted packages `name` imports with the given kind
    pub fn dependencies_of(&self, name: &str, kind: ImportKind) -> Vec<&str> {
        let Some(index) = self.node_map.get(name) else {
            return Vec::new();
        };
        let mut deps: Vec<&str> = self
            .graph
            .edges_directed(*index, Direction::Outgoing)
            .filter(|edge| *edge.weight() == kind)
            .map(|edge| self.graph[edge.target()].as_str())
            .collect();
        deps.sort_unstable();
        deps.dedup();
        deps
    }

    /// Sorted packages that import `name` with any kind
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        let Some(index) = self.node_map.get(name) else {
            return Vec::new();
        };
        let mut users: Vec<&str> = self
            .graph
            .neighbors_directed(*index, Direction::Incoming)
            .map(|node| self.graph[node].as_str())
            .collect();
        users.sort_unstable();
        users.dedup();
        users
    }

    /// All edges as `(dependent, dependency, kind)`, sorted
    pub fn edges(&self) -> Vec<(&str, &str, ImportKind)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].as_str(),
                    self.graph[edge.target()].as_str(),
                    *edge.weight(),
                )
            })
            .collect();
        edges.sort_by(|a, b| (a.0, a.1, a.2 as u8).cmp(&(b.0, b.1, b.2 as u8)));
        edges
    }

    /// Packages with dependencies first, considering static imports only
    pub fn dependency_order(&self) -> LoaderResult<Vec<String>> {
        let static_graph = self.static_graph();
        match toposort(&static_graph, None) {
            Ok(sorted) => Ok(sorted
                .into_iter()
                .rev()
                .map(|index| static_graph[index].clone())
                .collect()),
            Err(cycle) => {
                let chain = Self::extract_cycle_path(&static_graph, cycle.node_id());
                let package = chain.first().cloned().unwrap_or_default();
                Err(AbleError::ImportCycle { package, chain })
            },
        }
    }

    /// Check that `order` lists every package once with each static
    /// dependency before its dependent
    pub fn is_valid_order<S: AsRef<str>>(&self, order: &[S]) -> bool {
        let positions: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(position, name)| (name.as_ref(), position))
            .collect();
        if positions.len() != order.len() || positions.len() != self.package_count() {
            return false;
        }
        self.graph
            .edge_references()
            .filter(|edge| *edge.weight() == ImportKind::Static)
            .all(|edge| {
                let from = positions.get(self.graph[edge.source()].as_str());
                let to = positions.get(self.graph[edge.target()].as_str());
                matches!((from, to), (Some(from), Some(to)) if to < from)
            })
    }

    fn static_graph(&self) -> DiGraph<String, ()> {
        self.graph.filter_map(
            |_, name| Some(name.clone()),
            |_, kind| (*kind == ImportKind::Static).then_some(()),
        )
    }

    /// Walk the strongly connected component holding `start` until a node
    /// repeats. Only edges that stay inside the component are followed, so
    /// the result always closes on itself.
    fn extract_cycle_path(graph: &DiGraph<String, ()>, start: NodeIndex) -> Vec<String> {
        let is_cyclic = |component: &Vec<NodeIndex>| {
            component.len() > 1 || graph.contains_edge(component[0], component[0])
        };
        let components = tarjan_scc(graph);
        let component: HashSet<NodeIndex> = components
            .iter()
            .find(|component| component.contains(&start) && is_cyclic(component))
            .or_else(|| components.iter().find(|component| is_cyclic(component)))
            .map(|component| component.iter().copied().collect())
            .unwrap_or_default();

        let mut current = if component.contains(&start) {
            start
        } else {
            match component.iter().min() {
                Some(node) => *node,
                None => return vec![graph[start].clone()],
            }
        };

        let mut visited = HashSet::new();
        let mut path: Vec<NodeIndex> = Vec::new();
        while visited.insert(current) {
            path.push(current);
            match graph.neighbors(current).filter(|next| component.contains(next)).min() {
                Some(next) => current = next,
                None => break,
            }
        }

        let cycle_start = path.iter().position(|node| *node == current).unwrap_or(0);
        let mut cycle: Vec<String> = path[cycle_start..].iter().map(|node| graph[*node].clone()).collect();
        cycle.push(graph[current].clone());
        cycle
    }
}

impl Default for ImportGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(packages: &[&str], edges: &[(&str, &str, ImportKind)]) -> ImportGraph {
        let mut graph = ImportGraph::new();
        for package in packages {
            graph.add_package(package);
        }
        for (from, to, kind) in edges {
            graph.add_dependency(from, to, *kind).unwrap();
        }
        graph
    }

    #[test]
    fn test_import_graph_creation() {
        let graph = ImportGraph::new();
        assert_eq!(graph.package_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_package_is_idempotent() {
        let mut graph = ImportGraph::new();
        let first = graph.add_package("app");
        let second = graph.add_package("app");
        assert_eq!(first, second);
        assert_eq!(graph.package_count(), 1);
    }

    #[test]
    fn test_add_dependency_missing_package() {
        let mut graph = graph(&["app"], &[]);
        let err = graph.add_dependency("app", "lib", ImportKind::Static).unwrap_err();
        assert!(matches!(err, AbleError::PackageNotFound { name } if name == "lib"));
    }

    #[test]
    fn test_dependency_queries() {
        let graph = graph(
            &["app", "lib", "plugins"],
            &[
                ("app", "lib", ImportKind::Static),
                ("app", "lib", ImportKind::Static),
                ("app", "plugins", ImportKind::Dynamic),
            ],
        );
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dependencies_of("app", ImportKind::Static), vec!["lib"]);
        assert_eq!(graph.dependencies_of("app", ImportKind::Dynamic), vec!["plugins"]);
        assert_eq!(graph.dependents_of("lib"), vec!["app"]);
        assert!(graph.dependencies_of("missing", ImportKind::Static).is_empty());
        assert_eq!(
            graph.edges(),
            vec![
                ("app", "lib", ImportKind::Static),
                ("app", "plugins", ImportKind::Dynamic)
            ]
        );
    }

    #[test]
    fn test_dependency_order() {
        let graph = graph(
            &["app", "net", "io"],
            &[("app", "net", ImportKind::Static), ("net", "io", ImportKind::Static)],
        );
        let order = graph.dependency_order().unwrap();
        assert_eq!(order, vec!["io", "net", "app"]);
        assert!(graph.is_valid_order(&order));
        assert!(!graph.is_valid_order(&["app", "net", "io"]));
        assert!(!graph.is_valid_order(&["io", "net"]));
    }

    #[test]
    fn test_dynamic_cycles_are_allowed() {
        let graph = graph(
            &["a", "b"],
            &[("a", "b", ImportKind::Static), ("b", "a", ImportKind::Dynamic)],
        );
        assert_eq!(graph.dependency_order().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_static_cycle_is_reported() {
        let graph = graph(
            &["a", "b"],
            &[("a", "b", ImportKind::Static), ("b", "a", ImportKind::Static)],
        );
        match graph.dependency_order().unwrap_err() {
            AbleError::ImportCycle { chain, .. } => {
                assert_eq!(chain.len(), 3);
                assert_eq!(chain.first(), chain.last());
            },
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_chain_stays_inside_the_cycle() {
        let graph = graph(
            &["a", "b", "c"],
            &[
                ("a", "b", ImportKind::Static),
                ("b", "a", ImportKind::Static),
                ("b", "c", ImportKind::Static),
                ("a", "c", ImportKind::Static),
            ],
        );
        match graph.dependency_order().unwrap_err() {
            AbleError::ImportCycle { package, chain } => {
                assert_eq!(chain.len(), 3);
                assert_eq!(chain.first(), chain.last());
                assert_eq!(chain.first(), Some(&package));
                assert!(!chain.contains(&"c".to_string()));
            },
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_loop_cycle() {
        let graph = graph(
            &["a", "b"],
            &[("b", "a", ImportKind::Static), ("a", "a", ImportKind::Static)],
        );
        match graph.dependency_order().unwrap_err() {
            AbleError::ImportCycle { chain, .. } => assert_eq!(chain, vec!["a", "a"]),
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_from_program_edges_skip_unloaded_dynamic_imports() {
        use able_core::types::{PackageOrigin, RootKind};
        use crate::program::Module;
        use able_parser::ast::{FileId, NodeId, SourceModule};
        use camino::Utf8PathBuf;
        use std::collections::BTreeMap;
        use std::sync::Arc;

        let module = |name: &str, imports: &[&str], dyn_imports: &[&str]| {
            Arc::new(Module {
                name: name.to_string(),
                ast: SourceModule {
                    id: NodeId { file: FileId(0), local: 0 },
                    package: None,
                    imports: Vec::new(),
                    body: Vec::new(),
                },
                files: vec![Utf8PathBuf::from(format!("/r/{}.able", name))],
                imports: imports.iter().map(|s| s.to_string()).collect(),
                dyn_imports: dyn_imports.iter().map(|s| s.to_string()).collect(),
                node_origins: BTreeMap::new(),
                origin: PackageOrigin {
                    root_directory: Utf8PathBuf::from("/r"),
                    root_name: "r".to_string(),
                    kind: RootKind::User,
                },
            })
        };
        let lib = module("r.lib", &[], &[]);
        let app = module("r", &["r.lib", "r.lib"], &["r.missing", "r.lib"]);
        let program = Program {
            entry: Arc::clone(&app),
            modules: vec![lib, app],
        };

        let graph = ImportGraph::from_program(&program);
        assert_eq!(
            graph.edges(),
            vec![("r", "r.lib", ImportKind::Static), ("r", "r.lib", ImportKind::Dynamic)]
        );
        assert!(!graph.contains("r.missing"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn dependency_order_validity(
            num_packages in 2usize..8,
            edges in prop::collection::vec((0usize..7, 0usize..7), 0..16)
        ) {
            let mut graph = ImportGraph::new();
            let names: Vec<String> = (0..num_packages).map(|i| format!("pkg{}", i)).collect();
            for name in &names {
                graph.add_package(name);
            }

            // Only edges from lower to higher index, so the graph is a DAG
            for (from, to) in edges {
                if from < num_packages && to < num_packages && from < to {
                    graph.add_dependency(&names[from], &names[to], ImportKind::Static).unwrap();
                }
            }

            let order = graph.dependency_order().unwrap();
            prop_assert_eq!(order.len(), num_packages);
            prop_assert!(graph.is_valid_order(&order));
        }

        #[test]
        fn back_edge_creates_cycle(chain_len in 2usize..7) {
            let mut graph = ImportGraph::new();
            let names: Vec<String> = (0..chain_len).map(|i| format!("pkg{}", i)).collect();
            for name in &names {
                graph.add_package(name);
            }
            for pair in names.windows(2) {
                graph.add_dependency(&pair[0], &pair[1], ImportKind::Static).unwrap();
            }
            prop_assert!(graph.dependency_order().is_ok());

            graph.add_dependency(&names[chain_len - 1], &names[0], ImportKind::Static).unwrap();
            let is_cycle = matches!(graph.dependency_order(), Err(AbleError::ImportCycle { .. }));
            prop_assert!(is_cycle);
        }
    }
}
