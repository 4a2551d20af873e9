//! Benchmarks for full discovery runs
//!
//! Measures live discovery over synthetic libraries of growing size, GIR
//! decoding, and format discovery over large operation name sets.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use opmodel_core::ModelConfig;
use opmodel_core::traits::RawDefault;
use opmodel_introspector::fixture::{FixtureOperation, FixtureTypeSystem, sample_library};
use opmodel_introspector::registry::{EnumRegistry, FormatTable};
use opmodel_introspector::{LiveDiscovery, ModelBuilder, StaticDiscovery};
use std::hint::black_box;

const GIR_FIXTURE: &str = include_str!("../tests/fixtures/vips-mini.gir");

/// Builds a library with `count` operations spread over nested classes
fn synthetic_library(count: usize) -> FixtureTypeSystem {
    let mut types = FixtureTypeSystem::new();
    types.add_enum(
        "VipsExtend",
        &[
            ("VIPS_EXTEND_BLACK", "black", 0),
            ("VIPS_EXTEND_COPY", "copy", 1),
        ],
    );
    for class in 0..8 {
        types.add_abstract(&format!("VipsGroup{class}"), "VipsOperation");
    }
    for index in 0..count {
        let operation = FixtureOperation::new(format!("op{index}"), "synthetic operation")
            .input("in", "VipsImage")
            .output("out", "VipsImage")
            .input("coefficients", "VipsArrayDouble")
            .optional_input("extend", "VipsExtend", Some(RawDefault::Enum(0)))
            .optional_input("scale", "gdouble", Some(RawDefault::Double(1.0)));
        types.add_operation_under(&format!("VipsGroup{}", index % 8), operation);
    }
    types
}

/// Benchmarks the live walker plus the whole builder pipeline
fn bench_live_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("live_build");

    for size in [10_usize, 100, 1000] {
        let types = synthetic_library(size);
        group.throughput(Throughput::Elements(u64::try_from(size).unwrap()));
        group.bench_with_input(BenchmarkId::from_parameter(size), &types, |b, types| {
            let builder = ModelBuilder::new(ModelConfig::default());
            b.iter(|| {
                let live = LiveDiscovery::new(types);
                builder.build(&[black_box(&live)]).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmarks decoding the GIR fixture
fn bench_gir_parse(c: &mut Criterion) {
    c.bench_function("gir_parse", |b| {
        b.iter(|| StaticDiscovery::parse("bench", black_box(GIR_FIXTURE)).unwrap());
    });
}

/// Benchmarks the converged run over the sample library and GIR fixture
fn bench_converged_build(c: &mut Criterion) {
    let types = sample_library();
    let gir = StaticDiscovery::parse("bench", GIR_FIXTURE).unwrap();
    let builder = ModelBuilder::default();

    c.bench_function("converged_build", |b| {
        b.iter(|| {
            let live = LiveDiscovery::new(&types);
            builder.build(&[&live, &gir]).unwrap()
        });
    });
}

/// Benchmarks format discovery over many operation names
fn bench_format_discovery(c: &mut Criterion) {
    let enums = EnumRegistry::new(&ModelConfig::default());
    let names: Vec<String> = (0..500)
        .flat_map(|i| {
            [
                format!("fmt{i}load"),
                format!("fmt{i}load_buffer"),
                format!("fmt{i}save"),
                format!("op{i}"),
            ]
        })
        .collect();

    c.bench_function("format_discovery_2000_names", |b| {
        b.iter(|| FormatTable::discover(names.iter().map(String::as_str), black_box(&enums)));
    });
}

criterion_group!(
    benches,
    bench_live_build,
    bench_gir_parse,
    bench_converged_build,
    bench_format_discovery
);
criterion_main!(benches);
