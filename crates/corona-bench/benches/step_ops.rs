//! Criterion benchmarks for a full species evolve.

use criterion::{criterion_group, criterion_main, Criterion};
use corona_bench::{reference_profile, stress_profile};
use corona_core::Backend;

fn bench_reference_step(c: &mut Criterion) {
    for backend in Backend::ALL {
        let mut profile = reference_profile(backend);
        c.bench_function(&format!("evolve_reference_{}", backend.name()), |b| {
            b.iter(|| profile.step());
        });
    }
}

fn bench_stress_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("stress");
    group.sample_size(10);
    let mut profile = stress_profile(Backend::Parallel);
    group.bench_function("evolve_stress_parallel", |b| {
        b.iter(|| profile.step());
    });
    group.finish();
}

criterion_group!(benches, bench_reference_step, bench_stress_step);
criterion_main!(benches);
