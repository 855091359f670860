//! Source parser for Able modules
//!
//! This crate turns `.able` source text into a small syntax tree that carries
//! exactly what the package loader needs: the package declaration, top-level
//! imports, `dynimport` statements anywhere in the body, and block structure.
//! Every node gets a stable [`NodeId`] at construction time so provenance can
//! be tracked after multi-file merges.

pub mod ast;
pub mod parser;

// Re-export main types
pub use ast::{
    Block, FileId, Identifier, ImportSelector, ImportStatement, NodeId, NodeIds, OpaqueStatement,
    PackageStatement, SourceModule, Statement,
};
pub use parser::{LineParser, ParseError, SourceParser};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;
