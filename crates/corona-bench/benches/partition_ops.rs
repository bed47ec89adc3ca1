//! Criterion micro-benchmarks for buffer classification, partition and reorder.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use corona_core::{Backend, Real, Vec3};
use corona_particles::{classify, partition, partition_two_masks, BufferMasks};
use corona_test_utils::{buffer_mask_from_x, geometry, tile_at};

/// 100K deterministic positions spread over a 32³ unit-cell box.
fn positions() -> Vec<Vec3> {
    (0u64..100_000)
        .map(|i| {
            let f = |m: u64| (i.wrapping_mul(m) % 32_000) as Real / 1000.0;
            [
                f(6364136223846793007),
                f(1442695040888963407),
                f(2862933555777941757),
            ]
        })
        .collect()
}

fn bench_partition(c: &mut Criterion) {
    let geom = geometry([32, 32, 32], 1.0);
    let mask = buffer_mask_from_x(&geom, 0, 24);
    let tile = tile_at(&positions());

    for backend in Backend::ALL {
        let flags = classify(&tile, &geom, &mask, backend);
        c.bench_function(&format!("classify_100k_{}", backend.name()), |b| {
            b.iter(|| black_box(classify(&tile, &geom, &mask, backend)));
        });
        c.bench_function(&format!("partition_100k_{}", backend.name()), |b| {
            b.iter(|| black_box(partition(&flags, backend)));
        });
    }
}

fn bench_two_masks(c: &mut Criterion) {
    let geom = geometry([32, 32, 32], 1.0);
    let current = buffer_mask_from_x(&geom, 0, 24);
    let gather = buffer_mask_from_x(&geom, 0, 28);
    let masks = BufferMasks {
        current: &current,
        gather: &gather,
        current_width: 8,
        gather_width: 4,
    };
    let tile = tile_at(&positions());

    c.bench_function("partition_two_masks_and_reorder_100k", |b| {
        b.iter_batched(
            || tile.clone(),
            |mut t| {
                let split = partition_two_masks(&t, &geom, masks, Backend::Parallel);
                t.reorder(&split.permutation, Backend::Parallel);
                black_box(t)
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_partition, bench_two_masks);
criterion_main!(benches);
