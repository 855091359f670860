//! Core data types for Able package loading.
//!
//! This module provides the fundamental types used throughout the loader:
//! - Root kinds and root descriptors
//! - Search path configuration entries
//! - Package origins used for conflict detection

pub mod root;

// Re-export all public types
pub use root::{PackageOrigin, Root, RootKind, SearchPath};
