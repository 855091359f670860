//! Common utilities for benchmarks

use camino::{Utf8Path, Utf8PathBuf};
use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use std::fs;
use tempfile::TempDir;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(50)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Generated package root on disk
pub struct SourceTree {
    _temp: TempDir,
    pub root: Utf8PathBuf,
    pub entry: Utf8PathBuf,
}

impl SourceTree {
    /// Root `bench` with `packages` sub-packages of `files` files each.
    ///
    /// Package `bench.pN` imports `bench.pN-1`, and the entry imports every
    /// package, so the static graph is a chain plus a fan-in.
    pub fn generate(packages: usize, files: usize) -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp
            .path()
            .canonicalize()
            .ok()
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
            .expect("utf-8 temp dir");
        write(&root.join("package.yml"), "name: bench\n");

        let mut entry_source = String::new();
        for package in 0..packages {
            entry_source.push_str(&format!("import bench.p{};\n", package));
            for file in 0..files {
                let mut source = String::new();
                if package > 0 && file == 0 {
                    source.push_str(&format!("import bench.p{};\n\n", package - 1));
                }
                source.push_str(&format!(
                    "fn f{}() {{\n  value = {}\n  return value\n}}\n",
                    file, file
                ));
                write(&root.join(format!("p{}/f{}.able", package, file)), &source);
            }
        }
        entry_source.push_str("\nfn main() {\n}\n");
        let entry = root.join("main.able");
        write(&entry, &entry_source);

        Self {
            _temp: temp,
            root,
            entry,
        }
    }

    /// Every generated source file, sorted
    pub fn source_files(&self) -> Vec<Utf8PathBuf> {
        let mut files: Vec<Utf8PathBuf> = walk(&self.root)
            .into_iter()
            .filter(|path| path.extension() == Some("able"))
            .collect();
        files.sort();
        files
    }
}

fn write(path: &Utf8Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create package dir");
    }
    fs::write(path, contents).expect("write source file");
}

fn walk(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut out = Vec::new();
    for entry in dir.read_dir_utf8().expect("read dir") {
        let path = entry.expect("dir entry").into_path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}
