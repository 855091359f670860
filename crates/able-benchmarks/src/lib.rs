//! Able loader benchmarking suite
//!
//! Benchmarks for source indexing, package merging, full program loads and
//! source checksums.

pub mod common;

pub use common::*;
