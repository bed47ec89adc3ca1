//! Near/buffer classification, stable partition, and reordering.
//!
//! A particle is in the *buffer* class when the mask value of its cell is
//! nonzero, and in the *near* class otherwise. A position whose cell lies
//! outside the mask's storage box counts as buffer.
//!
//! [`partition`] is stable: near indices come first in their original
//! relative order, buffer indices follow in theirs. Both backends return
//! the same permutation for the same predicate, whatever the tie pattern.

use std::ops::Range;

use corona_core::{Backend, RealComp};
use corona_mesh::{Geometry, MaskArray};
use rayon::prelude::*;

use crate::tile::ParticleTile;

/// A reordering of a tile plus the near/buffer split point.
///
/// `indices()[i]` is the old index of the particle that moves to slot `i`.
/// Slots `0..split()` hold near particles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permutation {
    indices: Vec<usize>,
    split: usize,
}

impl Permutation {
    /// The identity on `n` elements with every element near.
    pub fn identity(n: usize) -> Self {
        Self {
            indices: (0..n).collect(),
            split: n,
        }
    }

    /// Wrap explicit indices.
    ///
    /// # Panics
    ///
    /// If `indices` is not a permutation of `0..indices.len()` or
    /// `split > indices.len()`.
    pub fn from_indices(indices: Vec<usize>, split: usize) -> Self {
        assert!(split <= indices.len(), "split {split} beyond length {}", indices.len());
        let mut seen = vec![false; indices.len()];
        for &i in &indices {
            assert!(
                i < seen.len() && !std::mem::replace(&mut seen[i], true),
                "not a permutation: index {i} out of range or repeated"
            );
        }
        Self { indices, split }
    }

    /// Old index of each new slot.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of near-class elements.
    pub fn split(&self) -> usize {
        self.split
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` for the permutation on zero elements.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether no element moves.
    pub fn is_identity(&self) -> bool {
        self.indices.iter().enumerate().all(|(i, &j)| i == j)
    }

    /// The permutation that undoes this one:
    /// `reorder(reorder(a, p), p.inverse()) == a`.
    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.indices.len()];
        for (new, &old) in self.indices.iter().enumerate() {
            inv[old] = new;
        }
        Self {
            indices: inv,
            split: self.split,
        }
    }
}

/// Whether each committed particle of `tile` sits in a buffer cell.
///
/// The cell is found from the position through `geom`; the mask is read
/// only.
pub fn classify(
    tile: &ParticleTile,
    geom: &Geometry,
    mask: &MaskArray,
    backend: Backend,
) -> Vec<bool> {
    classify_range(tile, 0, geom, mask, backend)
}

/// [`classify`] restricted to particles `start..` of `tile`. Entry `i` of
/// the result describes particle `start + i`.
pub fn classify_range(
    tile: &ParticleTile,
    start: usize,
    geom: &Geometry,
    mask: &MaskArray,
    backend: Backend,
) -> Vec<bool> {
    let x = &tile.comp(RealComp::X)[start..];
    let y = &tile.comp(RealComp::Y)[start..];
    let z = &tile.comp(RealComp::Z)[start..];
    let is_buffer = |i: usize| {
        let iv = geom.cell_index([x[i], y[i], z[i]]);
        mask.try_get(iv).map_or(true, |m| m != 0)
    };
    match backend {
        Backend::Sequential => (0..x.len()).map(is_buffer).collect(),
        Backend::Parallel => (0..x.len()).into_par_iter().map(is_buffer).collect(),
    }
}

/// Stable partition of `0..predicate.len()`: elements whose predicate is
/// `false` (near) first, then those whose predicate is `true` (buffer).
pub fn partition(is_buffer: &[bool], backend: Backend) -> Permutation {
    let mut indices = Vec::with_capacity(is_buffer.len());
    let split = partition_into(&mut indices, 0..is_buffer.len(), |i| is_buffer[i], backend);
    Permutation { indices, split }
}

/// Append the stable partition of `range` to `out` and return the
/// number of near elements appended.
fn partition_into(
    out: &mut Vec<usize>,
    range: Range<usize>,
    is_buffer: impl Fn(usize) -> bool + Sync,
    backend: Backend,
) -> usize {
    let before = out.len();
    match backend {
        Backend::Sequential => {
            out.extend(range.clone().filter(|&i| !is_buffer(i)));
            let split = out.len() - before;
            out.extend(range.filter(|&i| is_buffer(i)));
            split
        }
        Backend::Parallel => {
            // Rayon's collect keeps source order, so the result is stable.
            let near: Vec<usize> =
                range.clone().into_par_iter().filter(|&i| !is_buffer(i)).collect();
            let buffer: Vec<usize> = range.into_par_iter().filter(|&i| is_buffer(i)).collect();
            let split = near.len();
            out.extend(near);
            out.extend(buffer);
            split
        }
    }
}

/// `dst[i] = src[perm.indices()[i]]`, into freshly allocated storage.
///
/// # Panics
///
/// If `src` and `perm` differ in length.
pub fn reorder<T: Copy + Send + Sync>(src: &[T], perm: &Permutation, backend: Backend) -> Vec<T> {
    assert_eq!(src.len(), perm.len(), "reorder: source length does not match permutation");
    match backend {
        Backend::Sequential => perm.indices.iter().map(|&i| src[i]).collect(),
        Backend::Parallel => perm.indices.par_iter().map(|&i| src[i]).collect(),
    }
}

/// Near/buffer masks for current deposition and field gather, with the
/// buffer widths they were built from.
#[derive(Clone, Copy, Debug)]
pub struct BufferMasks<'a> {
    /// Buffer mask for current deposition.
    pub current: &'a MaskArray,
    /// Buffer mask for field gather.
    pub gather: &'a MaskArray,
    /// Width in cells of the current-deposition buffer.
    pub current_width: u32,
    /// Width in cells of the field-gather buffer.
    pub gather_width: u32,
}

/// Result of partitioning by both buffer masks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwoMaskSplit {
    /// The combined reordering.
    pub permutation: Permutation,
    /// Particles `0..nfine_current` deposit on the fine patch only.
    pub nfine_current: usize,
    /// Particles `0..nfine_gather` gather from the fine patch.
    pub nfine_gather: usize,
}

/// Partition by the wider buffer first, then split that buffer's
/// particles again by the narrower one.
///
/// The result orders particles as: near for both masks, then near only
/// for the narrower buffer, then buffer for both. When both masks are the
/// same array, or the narrower width is zero, the second pass is skipped.
pub fn partition_two_masks(
    tile: &ParticleTile,
    geom: &Geometry,
    masks: BufferMasks<'_>,
    backend: Backend,
) -> TwoMaskSplit {
    let current_is_wider = masks.current_width > masks.gather_width;
    let (wide, narrow, narrow_width) = if current_is_wider {
        (masks.current, masks.gather, masks.gather_width)
    } else {
        (masks.gather, masks.current, masks.current_width)
    };

    let first = partition(&classify(tile, geom, wide, backend), backend);
    let sep = first.split();
    let n = first.len();

    let same = std::ptr::eq(masks.current, masks.gather);
    let (permutation, sep2) = if same {
        (first, sep)
    } else if narrow_width == 0 {
        // An empty narrow buffer leaves every particle near.
        (first, n)
    } else {
        // Classify the tail in its permuted order, then stably split it.
        let tail = &first.indices[sep..];
        let flags = classify_tail(tile, tail, geom, narrow, backend);
        let mut indices = first.indices[..sep].to_vec();
        indices.reserve(n - sep);
        let near_tail = partition_into(&mut indices, 0..tail.len(), |k| flags[k], backend);
        // `partition_into` appended positions within `tail`; map them back.
        for slot in &mut indices[sep..] {
            *slot = tail[*slot];
        }
        (Permutation { indices, split: sep }, sep + near_tail)
    };

    let (nfine_current, nfine_gather) = if same {
        (sep, sep)
    } else if current_is_wider {
        (sep, sep2)
    } else {
        (sep2, sep)
    };
    TwoMaskSplit {
        permutation: Permutation {
            split: nfine_current,
            ..permutation
        },
        nfine_current,
        nfine_gather,
    }
}

fn classify_tail(
    tile: &ParticleTile,
    tail: &[usize],
    geom: &Geometry,
    mask: &MaskArray,
    backend: Backend,
) -> Vec<bool> {
    let is_buffer = |&i: &usize| {
        let iv = geom.cell_index(tile.position(i));
        mask.try_get(iv).map_or(true, |m| m != 0)
    };
    match backend {
        Backend::Sequential => tail.iter().map(is_buffer).collect(),
        Backend::Parallel => tail.par_iter().map(is_buffer).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_stable() {
        let pred = [true, false, true, false, false, true];
        for backend in Backend::ALL {
            let p = partition(&pred, backend);
            assert_eq!(p.indices(), &[1, 3, 4, 0, 2, 5]);
            assert_eq!(p.split(), 3);
        }
    }

    #[test]
    fn empty_input() {
        for backend in Backend::ALL {
            let p = partition(&[], backend);
            assert!(p.is_empty());
            assert_eq!(p.split(), 0);
            assert!(reorder::<f64>(&[], &p, backend).is_empty());
        }
    }

    #[test]
    fn all_one_class() {
        let p = partition(&[false; 4], Backend::Sequential);
        assert!(p.is_identity());
        assert_eq!(p.split(), 4);
        let p = partition(&[true; 4], Backend::Parallel);
        assert!(p.is_identity());
        assert_eq!(p.split(), 0);
    }

    #[test]
    fn inverse_undoes_reorder() {
        let p = Permutation::from_indices(vec![3, 0, 2, 1], 2);
        let src = [10, 20, 30, 40];
        let fwd = reorder(&src, &p, Backend::Sequential);
        assert_eq!(fwd, vec![40, 10, 30, 20]);
        assert_eq!(reorder(&fwd, &p.inverse(), Backend::Sequential), src);
    }

    #[test]
    #[should_panic(expected = "not a permutation")]
    fn from_indices_rejects_repeats() {
        Permutation::from_indices(vec![0, 0, 1], 0);
    }
}
