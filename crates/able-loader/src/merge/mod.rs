//! Multi-file package merging
//!
//! Every file of a package is parsed on its own (in parallel) and the results
//! are folded into one logical module. Each node keeps a record of the file
//! it came from.

use able_core::error::{AbleError, DiagnosticLocation, ParserDiagnostic};
use able_core::types::PackageOrigin;
use able_core::utils::name::split_name;
use able_parser::ast::{FileId, NodeIds, PackageStatement, SourceModule};
use able_parser::parser::{ParseError, SourceParser};
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use tracing::debug;

use crate::program::Module;
use crate::LoaderResult;

/// Hands out file ids in request order for one load session
#[derive(Debug, Default)]
pub struct FileIds {
    next: u32,
}

impl FileIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `count` consecutive ids and return the first
    pub fn reserve(&mut self, count: usize) -> FileId {
        let first = FileId(self.next);
        self.next += count as u32;
        first
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u32 {
        self.next
    }
}

/// One parsed source file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: Utf8PathBuf,
    pub file_id: FileId,
    pub ast: SourceModule,
}

/// Parses and merges the files of one package
#[derive(Clone, Copy)]
pub struct PackageMerger<'p> {
    parser: &'p dyn SourceParser,
}

impl<'p> PackageMerger<'p> {
    pub fn new(parser: &'p dyn SourceParser) -> Self {
        Self { parser }
    }

    /// Parse and merge a package in one step.
    ///
    /// Ids are reserved for every file plus one synthetic id for the nodes
    /// the merge creates.
    pub fn merge(
        &self,
        name: &str,
        files: &[Utf8PathBuf],
        file_ids: &mut FileIds,
        origin: PackageOrigin,
    ) -> LoaderResult<Module> {
        let mut files = files.to_vec();
        files.sort();
        files.dedup();
        if files.is_empty() {
            return Err(AbleError::internal(format!("package {} has no files to merge", name)));
        }

        let first = file_ids.reserve(files.len() + 1);
        let parsed = self.parse_files(&files, first)?;
        let synthetic = FileId(first.0 + files.len() as u32);
        self.combine(name, parsed, synthetic, origin)
    }

    /// Parse files in parallel, assigning ids from `first` upward.
    ///
    /// The first failure in file order is reported.
    pub fn parse_files(&self, files: &[Utf8PathBuf], first: FileId) -> LoaderResult<Vec<ParsedFile>> {
        let results: Vec<LoaderResult<ParsedFile>> = files
            .par_iter()
            .enumerate()
            .map(|(offset, path)| self.parse_file(path, FileId(first.0 + offset as u32)))
            .collect();
        results.into_iter().collect()
    }

    /// Parse a single file
    pub fn parse_file(&self, path: &Utf8Path, file_id: FileId) -> LoaderResult<ParsedFile> {
        let source = fs::read_to_string(path)
            .map_err(|e| AbleError::io(format!("Failed to read {}", path), e))?;
        let ast = self
            .parser
            .parse(file_id, &source)
            .map_err(|e| parse_diagnostic(path, e))?;
        Ok(ParsedFile {
            path: path.to_path_buf(),
            file_id,
            ast,
        })
    }

    /// Fold parsed files, in the given order, into one module.
    ///
    /// `synthetic` identifies the merged root and package statement, which
    /// are attributed to the first file.
    pub fn combine(
        &self,
        name: &str,
        parsed: Vec<ParsedFile>,
        synthetic: FileId,
        origin: PackageOrigin,
    ) -> LoaderResult<Module> {
        let first_path = match parsed.first() {
            Some(file) => file.path.clone(),
            None => {
                return Err(AbleError::internal(format!(
                    "package {} has no files to merge",
                    name
                )))
            },
        };

        let is_private = parsed
            .iter()
            .find_map(|file| file.ast.package.as_ref())
            .is_some_and(|package| package.is_private);

        let mut ids = NodeIds::new(synthetic);
        let root_id = ids.next_id();
        let package = PackageStatement::from_segments(&mut ids, &split_name(name), is_private);

        let mut node_origins = BTreeMap::new();
        node_origins.insert(root_id, first_path.clone());
        node_origins.insert(package.id, first_path.clone());
        for ident in &package.name_path {
            node_origins.insert(ident.id, first_path.clone());
        }

        let mut files = Vec::with_capacity(parsed.len());
        let mut imports = Vec::new();
        let mut seen_imports = HashSet::new();
        let mut body = Vec::new();

        for file in parsed {
            file.ast.visit_ids(&mut |id| {
                node_origins.entry(id).or_insert_with(|| file.path.clone());
            });
            for import in file.ast.imports {
                if seen_imports.insert(import.key()) {
                    imports.push(import);
                }
            }
            body.extend(file.ast.body);
            files.push(file.path);
        }

        let ast = SourceModule {
            id: root_id,
            package: Some(package),
            imports,
            body,
        };
        let imports: Vec<String> = ast.import_names().into_iter().filter(|n| n != name).collect();
        let dyn_imports: Vec<String> =
            ast.dyn_import_names().into_iter().filter(|n| n != name).collect();

        debug!(
            "Merged {} from {} files ({} imports, {} dynamic)",
            name,
            files.len(),
            imports.len(),
            dyn_imports.len()
        );

        Ok(Module {
            name: name.to_string(),
            ast,
            files,
            imports,
            dyn_imports,
            node_origins,
            origin,
        })
    }
}

fn parse_diagnostic(path: &Utf8Path, err: ParseError) -> AbleError {
    AbleError::Parse {
        diagnostic: ParserDiagnostic {
            message: err.message,
            location: DiagnosticLocation {
                path: path.to_path_buf(),
                line: err.line,
                column: err.column,
                end_line: err.end_line,
                end_column: err.end_column,
            },
        },
    }
}
