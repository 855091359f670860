//! Utility functions and helpers.
//!
//! Common functionality used across multiple Able crates.

pub mod hash;
pub mod name;
pub mod path;

// Re-export commonly used utilities
pub use hash::{blake3_hash, checksum_files};
pub use name::{join_segments, sanitize_segment, split_name};
pub use path::{absolute_path, normalize_path, paths_overlap, utf8_path};
