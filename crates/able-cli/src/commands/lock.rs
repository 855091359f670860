//! Lock command: record every contributing root in a package.lock

use able_config::{LockedDependency, LockedPackage, Lockfile, LOCKFILE_NAME};
use able_core::error::AbleResult;
use able_core::utils::hash::checksum_files;
use able_loader::root::{read_manifest_field, MANIFEST_FILE};
use able_loader::{ImportGraph, ImportKind, Program};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::{load_program, CommandContext};
use crate::LoadArgs;

/// Version recorded for roots whose manifest has none
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Execute the lock command
pub fn execute(args: &LoadArgs, output: Option<Utf8PathBuf>, ctx: &CommandContext) -> anyhow::Result<()> {
    let program = load_program(args, ctx)?;
    let tool = format!("able-load {}", env!("CARGO_PKG_VERSION"));
    let lockfile = build_lockfile(&program, &tool)?;

    let path = match output {
        Some(path) => ctx.resolve(&path),
        None => program.entry.origin.root_directory.join(LOCKFILE_NAME),
    };
    if path.is_file() {
        ctx.output.warn(&format!("Overwriting existing {}", path));
    }
    lockfile.write(&path)?;
    info!("Wrote {} locked roots to {}", lockfile.packages.len(), path);
    ctx.output.success(&format!("Locked {} roots in {}", lockfile.packages.len(), path));
    Ok(())
}

struct RootEntry<'a> {
    name: &'a str,
    files: Vec<&'a Utf8Path>,
    dependencies: BTreeSet<&'a Utf8Path>,
}

/// Build a lockfile with one entry per root that contributed packages.
///
/// Root dependencies follow static imports that cross root boundaries.
pub fn build_lockfile(program: &Program, tool: &str) -> AbleResult<Lockfile> {
    let graph = ImportGraph::from_program(program);
    let mut roots: BTreeMap<&Utf8Path, RootEntry<'_>> = BTreeMap::new();

    for module in &program.modules {
        let directory = module.origin.root_directory.as_path();
        let entry = roots.entry(directory).or_insert_with(|| RootEntry {
            name: &module.origin.root_name,
            files: Vec::new(),
            dependencies: BTreeSet::new(),
        });
        entry.files.extend(module.files.iter().map(|f| f.as_path()));

        for dep in graph.dependencies_of(&module.name, ImportKind::Static) {
            if let Some(dep_module) = program.module(dep) {
                let dep_root = dep_module.origin.root_directory.as_path();
                if dep_root != directory {
                    entry.dependencies.insert(dep_root);
                }
            }
        }
    }

    let mut versions = BTreeMap::new();
    for directory in roots.keys() {
        versions.insert(*directory, root_version(directory)?);
    }

    let mut lockfile = Lockfile::new(program.entry.origin.root_name.clone(), tool);
    for (directory, entry) in &roots {
        let checksum = checksum_files(directory, &entry.files)?;
        debug!("Checksummed {} files in {}", entry.files.len(), directory);
        lockfile.packages.push(LockedPackage {
            name: entry.name.to_string(),
            version: versions[directory].clone(),
            source: format!("path:{}", directory),
            checksum,
            dependencies: entry
                .dependencies
                .iter()
                .map(|dep| LockedDependency {
                    name: roots[dep].name.to_string(),
                    version: versions[dep].clone(),
                })
                .collect(),
        });
    }
    lockfile.normalize();
    Ok(lockfile)
}

/// Version from the root's manifest, or [`DEFAULT_VERSION`]
fn root_version(directory: &Utf8Path) -> AbleResult<String> {
    let manifest = directory.join(MANIFEST_FILE);
    if !manifest.is_file() {
        return Ok(DEFAULT_VERSION.to_string());
    }
    Ok(read_manifest_field(&manifest, "version")?.unwrap_or_else(|| DEFAULT_VERSION.to_string()))
}
