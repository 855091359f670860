//! Package graph loading
//!
//! [`Loader`] turns an entry file into a [`Program`]: it discovers and
//! indexes roots, then resolves the import graph depth-first with an explicit
//! frame stack. A [`LoadSession`] owns all per-load state.

use able_core::error::AbleError;
use able_core::types::{Root, RootKind, SearchPath};
use able_core::utils::path::{absolute_path, contains_path_prefix, paths_overlap};
use able_parser::ast::FileId;
use able_parser::parser::{LineParser, SourceParser};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::index::{package_name, SourceIndexer};
use crate::merge::{FileIds, PackageMerger, ParsedFile};
use crate::namespace::{NamespaceAuthority, PackageIndex, PackageLocation};
use crate::program::{ImportKind, Module, Program};
use crate::root::{discover_root_for_path, RootResolver};
use crate::LoaderResult;


/// Per-load options
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Extra packages to resolve alongside the entry package
    pub include_packages: Vec<String>,
}

impl LoadOptions {
    pub fn with_packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include_packages: packages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Entry point for loading programs
#[derive(Clone)]
pub struct Loader {
    parser: Arc<dyn SourceParser>,
    search_paths: Vec<SearchPath>,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("search_paths", &self.search_paths)
            .finish_non_exhaustive()
    }
}

impl Loader {
    /// Create a loader using the built-in line parser
    pub fn new(search_paths: Vec<SearchPath>) -> LoaderResult<Self> {
        Self::with_parser(Arc::new(LineParser::new()), search_paths)
    }

    /// Create a loader with a custom parser.
    ///
    /// Search paths are made absolute and deduplicated; empty ones are
    /// dropped.
    pub fn with_parser(
        parser: Arc<dyn SourceParser>,
        search_paths: Vec<SearchPath>,
    ) -> LoaderResult<Self> {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(search_paths.len());
        for search_path in search_paths {
            if search_path.path.as_str().trim().is_empty() {
                continue;
            }
            let path = absolute_path(&search_path.path)?;
            if seen.insert(path.clone()) {
                unique.push(SearchPath {
                    path,
                    kind: search_path.kind,
                });
            }
        }
        Ok(Self {
            parser,
            search_paths: unique,
        })
    }

    /// Configured search roots after deduplication
    pub fn search_paths(&self) -> &[SearchPath] {
        &self.search_paths
    }

    /// Load the program rooted at `entry`
    pub fn load(&self, entry: &Utf8Path) -> LoaderResult<Program> {
        self.load_with_options(entry, &LoadOptions::default())
    }

    /// Load the program rooted at `entry`, resolving extra packages too
    pub fn load_with_options(&self, entry: &Utf8Path, options: &LoadOptions) -> LoaderResult<Program> {
        let entry = absolute_path(entry)?;
        match fs::metadata(&entry) {
            Ok(metadata) if metadata.is_dir() => {
                return Err(AbleError::EntryIsDirectory { path: entry })
            },
            Ok(_) => {},
            Err(_) => return Err(AbleError::EntryNotFound { path: entry }),
        }

        let indexer = SourceIndexer::new();
        let mut authority = NamespaceAuthority::new();

        let entry_root = RootResolver::new(&self.search_paths).entry_root(&entry)?;
        if !contains_path_prefix(&entry_root.directory, &entry) {
            return Err(AbleError::EntryOutsideRoot {
                entry,
                root: entry_root.directory,
            });
        }
        if !authority.ensure_namespace_allowed(&entry_root)? {
            return Err(AbleError::ReservedNamespace {
                path: entry_root.directory,
            });
        }

        let indexed = indexer.index(&entry_root)?;
        let entry_package = indexed
            .package_for(&entry)
            .map(str::to_string)
            .ok_or_else(|| AbleError::EntryNotIndexed {
                path: entry.clone(),
            })?;
        info!(
            "Entry package {} in root {} ({})",
            entry_package, entry_root.directory, entry_root.kind
        );
        authority.register(indexed)?;

        let mut used_roots = vec![entry_root.directory.clone()];
        for search_path in &self.search_paths {
            self.index_search_root(search_path, &entry_root, &mut used_roots, &indexer, &mut authority)?;
        }

        let mut requested: BTreeSet<String> = BTreeSet::new();
        requested.insert(entry_package.clone());
        requested.extend(
            options
                .include_packages
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        );
        requested.extend(authority.kernel_packages());

        let mut session = LoadSession::new(self.parser.as_ref(), authority.into_index());
        for name in &requested {
            session.resolve(name)?;
        }

        let program = session.into_program(&entry_package)?;
        info!(
            "Loaded {} packages ({} files) for {}",
            program.modules.len(),
            program.file_count(),
            entry
        );
        Ok(program)
    }

    fn index_search_root(
        &self,
        search_path: &SearchPath,
        entry_root: &Root,
        used_roots: &mut Vec<Utf8PathBuf>,
        indexer: &SourceIndexer,
        authority: &mut NamespaceAuthority,
    ) -> LoaderResult<()> {
        let (directory, name) = discover_root_for_path(&search_path.path)?;

        let overlaps = used_roots.iter().any(|used| paths_overlap(used, &directory));
        if overlaps && !(search_path.kind.is_stdlib() && !entry_root.kind.is_stdlib()) {
            debug!("Skipping search root {}: overlaps an indexed root", directory);
            return Ok(());
        }
        // Claimed even when it turns out empty
        used_roots.push(directory.clone());

        let mut root = Root::classified(directory, name);
        if search_path.kind.is_stdlib() {
            root.kind = RootKind::Stdlib;
        }
        if !authority.ensure_namespace_allowed(&root)? {
            return Err(AbleError::ReservedNamespace {
                path: root.directory,
            });
        }

        let indexed = indexer.index(&root)?;
        if indexed.is_empty() {
            warn!("Search root {} contains no Able sources", root.directory);
            return Ok(());
        }
        debug!(
            "Registering {} packages from {} ({})",
            indexed.packages.len(),
            root.directory,
            root.kind
        );
        authority.register(indexed)
    }
}

/// Pending resolution of one package
struct Frame {
    name: String,
    module: Module,
    deps: Vec<(String, ImportKind)>,
    cursor: usize,
}

/// State of one load: package index, memo cache and cycle guard
pub struct LoadSession<'p> {
    parser: &'p dyn SourceParser,
    index: PackageIndex,
    file_ids: FileIds,
    /// Memo cache; insertion order is dependency order
    loaded: IndexMap<String, Arc<Module>>,
    in_progress: HashSet<String>,
}

impl<'p> LoadSession<'p> {
    pub fn new(parser: &'p dyn SourceParser, index: PackageIndex) -> Self {
        Self {
            parser,
            index,
            file_ids: FileIds::new(),
            loaded: IndexMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Resolve a package and everything it imports.
    ///
    /// Dependencies are resolved before their dependents and every package is
    /// merged at most once per session.
    pub fn resolve(&mut self, name: &str) -> LoaderResult<Arc<Module>> {
        if let Some(module) = self.loaded.get(name) {
            return Ok(Arc::clone(module));
        }

        let mut stack: Vec<Frame> = Vec::new();
        let result = self.run(name, &mut stack);
        if result.is_err() {
            for frame in &stack {
                self.in_progress.remove(&frame.name);
            }
        }
        result
    }

    fn run(&mut self, name: &str, stack: &mut Vec<Frame>) -> LoaderResult<Arc<Module>> {
        let frame = self.open_frame(name, stack)?;
        stack.push(frame);

        loop {
            let Some(top) = stack.last_mut() else {
                return Err(AbleError::internal("resolution stack drained unexpectedly"));
            };

            if let Some((dep, kind)) = top.deps.get(top.cursor).cloned() {
                top.cursor += 1;
                let parent = top.name.clone();
                if self.loaded.contains_key(&dep) {
                    continue;
                }
                if !self.index.contains_key(&dep) {
                    match kind {
                        ImportKind::Static => {
                            return Err(AbleError::UnknownImport {
                                package: parent,
                                import: dep,
                            })
                        },
                        ImportKind::Dynamic => {
                            debug!("Skipping dynamic import {} from {}: not indexed", dep, parent);
                            continue;
                        },
                    }
                }
                let frame = self.open_frame(&dep, stack)?;
                stack.push(frame);
                continue;
            }

            let Some(done) = stack.pop() else {
                return Err(AbleError::internal("resolution stack drained unexpectedly"));
            };
            self.in_progress.remove(&done.name);
            let module = Arc::new(done.module);
            debug!("Resolved {} ({} files)", done.name, module.files.len());
            self.loaded.insert(done.name, Arc::clone(&module));
            if stack.is_empty() {
                return Ok(module);
            }
        }
    }

    fn open_frame(&mut self, name: &str, stack: &[Frame]) -> LoaderResult<Frame> {
        if self.in_progress.contains(name) {
            let mut chain: Vec<String> = stack
                .iter()
                .map(|frame| frame.name.clone())
                .skip_while(|frame| frame != name)
                .collect();
            chain.push(name.to_string());
            return Err(AbleError::ImportCycle {
                package: name.to_string(),
                chain,
            });
        }

        let location = self
            .index
            .get(name)
            .filter(|location| !location.files.is_empty())
            .cloned()
            .ok_or_else(|| AbleError::PackageNotFound {
                name: name.to_string(),
            })?;

        let module = self.merge(name, &location)?;
        self.in_progress.insert(name.to_string());

        let deps = module
            .imports
            .iter()
            .map(|dep| (dep.clone(), ImportKind::Static))
            .chain(module.dyn_imports.iter().map(|dep| (dep.clone(), ImportKind::Dynamic)))
            .filter(|(dep, _)| dep != name)
            .collect();

        Ok(Frame {
            name: name.to_string(),
            module,
            deps,
            cursor: 0,
        })
    }

    fn merge(&mut self, name: &str, location: &PackageLocation) -> LoaderResult<Module> {
        debug!("Merging {} from {} files", name, location.files.len());
        let merger = PackageMerger::new(self.parser);
        let first = self.file_ids.reserve(location.files.len() + 1);
        let parsed = merger.parse_files(&location.files, first)?;
        verify_package_names(name, &location.root, &parsed)?;
        let synthetic = FileId(first.0 + location.files.len() as u32);
        merger.combine(name, parsed, synthetic, location.root.origin())
    }

    /// Resolved module by name
    pub fn module(&self, name: &str) -> Option<&Arc<Module>> {
        self.loaded.get(name)
    }

    /// Resolved modules, dependencies first
    pub fn ordered(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.loaded.values()
    }

    /// Check if a package is currently being resolved
    pub fn is_in_progress(&self, name: &str) -> bool {
        self.in_progress.contains(name)
    }

    /// Finish the session into a program with the given entry package
    pub fn into_program(self, entry: &str) -> LoaderResult<Program> {
        let entry = self
            .loaded
            .get(entry)
            .cloned()
            .ok_or_else(|| AbleError::PackageNotFound {
                name: entry.to_string(),
            })?;
        Ok(Program {
            entry,
            modules: self.loaded.into_values().collect(),
        })
    }
}

/// Confirm each parsed file's own declaration places it in `expected`
fn verify_package_names(expected: &str, root: &Root, parsed: &[ParsedFile]) -> LoaderResult<()> {
    for file in parsed {
        let declared = file.ast.package.as_ref().map(|package| package.name());
        let found = package_name(root, &file.path, declared.as_deref());
        if found != expected {
            return Err(AbleError::PackageMismatch {
                path: file.path.clone(),
                found,
                expected: expected.to_string(),
            });
        }
    }
    Ok(())
}
