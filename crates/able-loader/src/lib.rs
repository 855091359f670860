//! Package graph loader for the Able compiler front-end
//!
//! Given an entry source file, this crate finds its package root, indexes
//! every package reachable from it (plus the always-linked kernel), merges
//! multi-file packages, rejects cycles, conflicts and missing dependencies,
//! and returns the packages in dependency order.

pub mod graph;
pub mod index;
pub mod loader;
pub mod merge;
pub mod namespace;
pub mod program;
pub mod root;

// Re-export main types
pub use graph::ImportGraph;
pub use index::{IndexedRoot, SourceIndexer};
pub use loader::{LoadOptions, LoadSession, Loader};
pub use merge::{FileIds, PackageMerger, ParsedFile};
pub use namespace::{NamespaceAuthority, PackageIndex, PackageLocation};
pub use program::{ImportKind, Module, ModuleSummary, Program, ProgramSummary};
pub use root::RootResolver;

use able_core::error::AbleError;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, AbleError>;
