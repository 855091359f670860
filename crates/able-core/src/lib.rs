//! # able-core
//!
//! Core types and utilities shared across all Able loader crates.
//!
//! This crate provides:
//! - Root, search path and package origin types
//! - AbleError enum for unified error handling
//! - Utility functions for paths, package names and checksums
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Root, RootKind, PackageOrigin, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{AbleError, AbleResult, DiagnosticLocation, ParserDiagnostic};
pub use types::{PackageOrigin, Root, RootKind, SearchPath};
