//! Property tests for classify / partition / reorder.

use corona_core::{AttributeMap, Backend, RealComp, TileId};
use corona_mesh::{Dimensionality, FieldArray, Geometry, IndexBox, MaskArray};
use corona_particles::{
    classify, partition, partition_two_masks, reorder, BufferMasks, ParticleTile, Permutation,
};
use proptest::prelude::*;

const N: usize = 8;

fn geometry() -> Geometry {
    Geometry::new(
        [0.0; 3],
        [1.0; 3],
        IndexBox::from_extent([N, N, N]).unwrap(),
        Dimensionality::Three,
    )
    .unwrap()
}

/// Buffer cells within `width` of the x faces of the box.
fn slab_mask(width: i32) -> MaskArray {
    let valid = IndexBox::from_extent([N, N, N]).unwrap();
    FieldArray::from_fn(valid, [1, 1, 1], |iv| {
        (iv[0] < width || iv[0] >= N as i32 - width) as i32
    })
    .unwrap()
}

fn tile_from(points: &[[f64; 3]]) -> ParticleTile {
    let mut t = ParticleTile::new(TileId::new(1, 0, 0), &AttributeMap::new());
    for (i, p) in points.iter().enumerate() {
        t.push(*p, [i as f64, 0.0, 0.0], 1.0);
    }
    t.commit_size();
    t
}

fn points() -> impl Strategy<Value = Vec<[f64; 3]>> {
    prop::collection::vec(prop::array::uniform3(-0.5f64..(N as f64 + 0.5)), 0..200)
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn partition_is_stable_and_backend_independent(pred in prop::collection::vec(any::<bool>(), 0..300)) {
        let seq = partition(&pred, Backend::Sequential);
        let par = partition(&pred, Backend::Parallel);
        prop_assert_eq!(&seq, &par);

        let idx = seq.indices();
        let split = seq.split();
        prop_assert_eq!(split, pred.iter().filter(|b| !**b).count());
        prop_assert!(idx[..split].iter().all(|&i| !pred[i]));
        prop_assert!(idx[split..].iter().all(|&i| pred[i]));
        // Relative order within each class is preserved.
        prop_assert!(idx[..split].windows(2).all(|w| w[0] < w[1]));
        prop_assert!(idx[split..].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn reorder_round_trips_through_inverse(
        values in prop::collection::vec(any::<i64>(), 0..200),
        seed in any::<u64>(),
    ) {
        let pred: Vec<bool> = (0..values.len())
            .map(|i| (seed.rotate_left(i as u32 % 64) ^ i as u64) & 1 == 1)
            .collect();
        for backend in Backend::ALL {
            let p = partition(&pred, backend);
            let fwd = reorder(&values, &p, backend);
            let back = reorder(&fwd, &p.inverse(), backend);
            prop_assert_eq!(&back, &values);
        }
    }

    #[test]
    fn classify_is_idempotent_and_backend_independent(pts in points()) {
        let t = tile_from(&pts);
        let g = geometry();
        let m = slab_mask(2);
        let a = classify(&t, &g, &m, Backend::Sequential);
        let b = classify(&t, &g, &m, Backend::Sequential);
        let c = classify(&t, &g, &m, Backend::Parallel);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }

    #[test]
    fn two_mask_split_orders_three_groups(pts in points(), current_wider in any::<bool>()) {
        let t = tile_from(&pts);
        let g = geometry();
        let wide = slab_mask(3);
        let narrow = slab_mask(1);
        let masks = if current_wider {
            BufferMasks { current: &wide, gather: &narrow, current_width: 3, gather_width: 1 }
        } else {
            BufferMasks { current: &narrow, gather: &wide, current_width: 1, gather_width: 3 }
        };
        let seq = partition_two_masks(&t, &g, masks, Backend::Sequential);
        let par = partition_two_masks(&t, &g, masks, Backend::Parallel);
        prop_assert_eq!(&seq, &par);

        let (sep, sep2) = if current_wider {
            (seq.nfine_current, seq.nfine_gather)
        } else {
            (seq.nfine_gather, seq.nfine_current)
        };
        prop_assert!(sep <= sep2 && sep2 <= t.len());
        prop_assert_eq!(seq.permutation.split(), seq.nfine_current);

        let wide_flags = classify(&t, &g, &wide, Backend::Sequential);
        let narrow_flags = classify(&t, &g, &narrow, Backend::Sequential);
        let idx = seq.permutation.indices();
        prop_assert!(idx[..sep].iter().all(|&i| !wide_flags[i]));
        prop_assert!(idx[sep..].iter().all(|&i| wide_flags[i]));
        prop_assert!(idx[sep..sep2].iter().all(|&i| !narrow_flags[i]));
        prop_assert!(idx[sep2..].iter().all(|&i| narrow_flags[i]));
        for range in [&idx[..sep], &idx[sep..sep2], &idx[sep2..]] {
            prop_assert!(range.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

#[test]
fn out_of_mask_positions_are_buffer() {
    let t = tile_from(&[[4.5, 4.5, 4.5], [-3.0, 4.5, 4.5], [4.5, 4.5, 100.0]]);
    let flags = classify(&t, &geometry(), &slab_mask(1), Backend::Sequential);
    assert_eq!(flags, vec![false, true, true]);
}

#[test]
fn escaped_particles_classify_as_buffer() {
    let t = tile_from(&[[1.0e12, 4.5, 4.5], [4.5, -1.0e300, 4.5], [4.5, 4.5, f64::NAN]]);
    for backend in Backend::ALL {
        assert_eq!(classify(&t, &geometry(), &slab_mask(1), backend), vec![true; 3]);
    }
}

#[test]
fn same_mask_for_both_uses_one_split() {
    let t = tile_from(&[[0.5, 1.0, 1.0], [4.0, 1.0, 1.0], [7.5, 1.0, 1.0], [3.0, 1.0, 1.0]]);
    let m = slab_mask(1);
    let split = partition_two_masks(
        &t,
        &geometry(),
        BufferMasks { current: &m, gather: &m, current_width: 1, gather_width: 2 },
        Backend::Sequential,
    );
    assert_eq!(split.nfine_current, 2);
    assert_eq!(split.nfine_gather, 2);
    assert_eq!(split.permutation.indices(), &[1, 3, 0, 2]);
}

#[test]
fn reordered_tile_keeps_particle_identity() {
    let pts = [[0.5, 1.0, 1.0], [4.0, 1.0, 1.0], [7.5, 1.0, 1.0], [3.0, 1.0, 1.0]];
    let mut t = tile_from(&pts);
    let flags = classify(&t, &geometry(), &slab_mask(1), Backend::Parallel);
    let perm = partition(&flags, Backend::Parallel);
    t.reorder(&perm, Backend::Parallel);
    // ux was set to the original index.
    assert_eq!(t.comp(RealComp::Ux), &[1.0, 3.0, 0.0, 2.0]);
    assert_eq!(t.position(0), pts[1]);

    t.reorder(&perm.inverse(), Backend::Sequential);
    assert_eq!(t.comp(RealComp::Ux), &[0.0, 1.0, 2.0, 3.0]);
    assert!(Permutation::identity(4).is_identity());
}
