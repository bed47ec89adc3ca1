//! Per-cell in-place sweeps over a region of one array.

use corona_core::{Backend, Real};
use corona_mesh::{FieldArray, IndexBox, IntVect};
use rayon::prelude::*;

/// Replace every cell `iv` of `target` inside `region` with
/// `kernel(iv, old)`.
///
/// Work is split by z-plane of the storage box. Each cell is written by
/// exactly one kernel call, so both backends produce identical arrays.
/// `region` is clipped to the storage box.
pub(crate) fn sweep(
    target: &mut FieldArray<Real>,
    region: IndexBox,
    backend: Backend,
    kernel: impl Fn(IntVect, Real) -> Real + Sync + Send,
) {
    let storage = target.storage_box();
    let Some(region) = region.intersect(&storage) else {
        return;
    };
    let slo = storage.lo();
    let nx = storage.size()[0];
    let plane = target.plane_len();
    let (lo, hi) = (region.lo(), region.hi());

    let update_plane = |(p, slab): (usize, &mut [Real])| {
        let k = slo[2] + p as i32;
        if k < lo[2] || k > hi[2] {
            return;
        }
        for j in lo[1]..=hi[1] {
            let row = nx * (j - slo[1]) as usize;
            for i in lo[0]..=hi[0] {
                let off = row + (i - slo[0]) as usize;
                slab[off] = kernel([i, j, k], slab[off]);
            }
        }
    };

    match backend {
        Backend::Sequential => target
            .as_mut_slice()
            .chunks_mut(plane)
            .enumerate()
            .for_each(&update_plane),
        Backend::Parallel => target
            .as_mut_slice()
            .par_chunks_mut(plane)
            .enumerate()
            .for_each(&update_plane),
    }
}
