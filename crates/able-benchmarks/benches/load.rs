//! Package loading performance benchmarks
//!
//! Covers root indexing, multi-file package merging and full program loads
//! over generated source trees of increasing size.

use able_benchmarks::{criterion_config, SourceTree};
use able_core::types::{Root, RootKind};
use able_loader::{FileIds, Loader, PackageMerger, SourceIndexer};
use able_parser::LineParser;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark indexing a root with a growing number of packages
fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_root");

    for packages in [10, 50, 200].iter() {
        let tree = SourceTree::generate(*packages, 4);
        let root = Root::new(tree.root.clone(), "bench".to_string(), RootKind::User);
        group.throughput(Throughput::Elements((*packages * 4) as u64));

        group.bench_with_input(BenchmarkId::new("packages", packages), &root, |b, root| {
            b.iter(|| black_box(SourceIndexer::new().index(root).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark parsing and merging one package with many files
fn bench_merging(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_package");
    let parser = LineParser::new();

    for files in [1, 16, 128].iter() {
        let tree = SourceTree::generate(1, *files);
        let root = Root::new(tree.root.clone(), "bench".to_string(), RootKind::User);
        let package_files: Vec<_> = tree
            .source_files()
            .into_iter()
            .filter(|path| path.parent().and_then(|p| p.file_name()) == Some("p0"))
            .collect();
        group.throughput(Throughput::Elements(*files as u64));

        group.bench_with_input(BenchmarkId::new("files", files), &package_files, |b, package_files| {
            b.iter(|| {
                let merger = PackageMerger::new(&parser);
                let mut ids = FileIds::new();
                black_box(merger.merge("bench.p0", package_files, &mut ids, root.origin()).unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark a complete load from the entry file
fn bench_full_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_load");
    group.measurement_time(std::time::Duration::from_secs(15));

    for packages in [10, 50, 200].iter() {
        let tree = SourceTree::generate(*packages, 2);
        let loader = Loader::new(Vec::new()).unwrap();
        group.throughput(Throughput::Elements(*packages as u64));

        group.bench_with_input(BenchmarkId::new("packages", packages), &tree, |b, tree| {
            b.iter(|| black_box(loader.load(&tree.entry).unwrap()));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_indexing, bench_merging, bench_full_load
}
criterion_main!(benches);
