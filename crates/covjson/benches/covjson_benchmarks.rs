//! Benchmarks for the covjson crate.
//!
//! Run with: cargo bench --package covjson
//! Or: cargo bench --package covjson --bench covjson_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use covjson::{flatten, Decoder, Encoder, EncoderConfig, GroupingAxes, ResultTree};
use test_utils::{coordinate_range, date_level_tree, date_param_tree, ensemble_tree, test_catalog};

fn lat_lon(count: usize) -> (Vec<f64>, Vec<f64>) {
    (coordinate_range(30.0, 0.25, count), coordinate_range(-10.0, 0.25, count))
}

// =============================================================================
// FLATTENING BENCHMARKS
// =============================================================================

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for size in [10usize, 50, 200] {
        let (lats, lons) = lat_lon(size);
        let tree = date_param_tree(&[20230101, 20230102], &[167, 228], &lats, &lons);
        group.throughput(Throughput::Elements((2 * 2 * size * size) as u64));
        group.bench_with_input(BenchmarkId::new("date", size), &tree, |b, tree| {
            b.iter(|| flatten(black_box(tree), GroupingAxes::Date))
        });
    }

    let (lats, lons) = lat_lon(50);
    let levels = date_level_tree(&[20230101], &[500, 700, 850, 1000], &[130], &lats, &lons);
    group.bench_function("date_level_50", |b| {
        b.iter(|| flatten(black_box(&levels), GroupingAxes::DateLevel))
    });

    let members = ensemble_tree(&[20230101], &[1, 2, 3, 4, 5], &[0, 6, 12], &[167], &lats, &lons);
    group.bench_function("date_number_step_50", |b| {
        b.iter(|| flatten(black_box(&members), GroupingAxes::DateNumberStep))
    });

    group.finish();
}

// =============================================================================
// ENCODING BENCHMARKS
// =============================================================================

fn encode(tree: &ResultTree, grouping: GroupingAxes) -> covjson::CoverageCollection {
    Encoder::new(EncoderConfig::with_grouping(grouping), test_catalog())
        .from_tree(tree)
        .unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let (lats, lons) = lat_lon(100);
    let tree = date_param_tree(&[20230101, 20230102, 20230103], &[167, 228], &lats, &lons);
    let catalog = test_catalog();

    group.bench_function("from_tree_100", |b| {
        b.iter(|| {
            Encoder::new(EncoderConfig::default(), catalog.clone()).from_tree(black_box(&tree))
        })
    });

    let doc = encode(&tree, GroupingAxes::Date);
    let json = doc.to_json().unwrap();
    group.throughput(Throughput::Bytes(json.len() as u64));
    group.bench_function("serialize_100", |b| b.iter(|| black_box(&doc).to_json()));

    // Pretty print (common for debugging/dev)
    group.bench_function("serialize_pretty_100", |b| {
        b.iter(|| black_box(&doc).to_json_pretty())
    });

    group.finish();
}

// =============================================================================
// DECODING BENCHMARKS
// =============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let (lats, lons) = lat_lon(100);
    let tree = date_param_tree(&[20230101, 20230102, 20230103], &[167, 228], &lats, &lons);
    let json = encode(&tree, GroupingAxes::Date).to_json().unwrap();

    group.throughput(Throughput::Bytes(json.len() as u64));
    group.bench_function("from_json_100", |b| {
        b.iter(|| Decoder::from_json(black_box(&json)))
    });

    let decoder = Decoder::from_json(&json).unwrap();
    group.bench_function("to_dataset_100", |b| {
        b.iter(|| black_box(&decoder).to_dataset())
    });

    group.finish();
}

criterion_group!(benches, bench_flatten, bench_encode, bench_decode);
criterion_main!(benches);
