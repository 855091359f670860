//! Configuration for the Able loader
//!
//! This crate assembles the loader's search roots from command-line flags,
//! the environment and bundled kernel/stdlib checkouts, and reads and writes
//! `package.lock` files.

pub mod lockfile;
pub mod search_paths;

// Re-export main types
pub use lockfile::{LockedDependency, LockedPackage, Lockfile, LOCKFILE_NAME};
pub use search_paths::{SearchPathCollector, ABLE_MODULE_PATHS_ENV, ABLE_PATH_ENV};

use able_core::error::AbleError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, AbleError>;
