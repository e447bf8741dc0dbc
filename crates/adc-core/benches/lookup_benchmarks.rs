//! Performance benchmarks for the ZA→ADC lookup table.
//!
//! Measures interpolated evaluation across the three supported methods and
//! the ZA→counts conversion that follows it on every `activate` call.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use adc_core::{orchestrator, InterpolationMethod, LookupTable};

fn table() -> LookupTable {
    LookupTable::from_rows(vec![
        (0.0, 0.0),
        (5.0, 9.0),
        (10.0, 20.0),
        (15.0, 33.0),
        (20.0, 48.0),
        (25.0, 68.0),
        (30.0, 95.0),
    ])
    .expect("fixed table is valid")
}

fn bench_evaluate(c: &mut Criterion) {
    let table = table();
    let mut group = c.benchmark_group("lookup_evaluate");

    for method in [InterpolationMethod::Pchip, InterpolationMethod::Cubic, InterpolationMethod::Akima] {
        let name = format!("{method:?}");
        group.bench_function(name, |b| {
            b.iter(|| black_box(table.evaluate(black_box(17.5), method)));
        });
    }

    group.finish();
}

fn bench_degree_to_count(c: &mut Criterion) {
    c.bench_function("degree_to_count", |b| {
        b.iter(|| black_box(orchestrator::degree_to_count(black_box(33.4))));
    });
}

criterion_group!(benches, bench_evaluate, bench_degree_to_count);
criterion_main!(benches);
