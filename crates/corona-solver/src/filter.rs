//! Bilinear (1-2-1) smoothing filter.
//!
//! Each pass along an axis replaces `f[i]` by
//! `0.25 f[i-1] + 0.5 f[i] + 0.25 f[i+1]`. A neighbour outside the
//! storage box is replaced by the cell's own value, so uniform fields pass
//! through unchanged. Passes along degenerate axes are skipped.
//!
//! The filter never mutates its input: [`BilinearFilter::apply`] returns a
//! filtered copy that gather reads instead of the original.

use corona_core::{Backend, Real};
use corona_mesh::{Dimensionality, FieldArray};

use crate::fields::EmFields;
use crate::sweep::sweep;

/// Number of 1-2-1 passes per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BilinearFilter {
    npass: [u32; 3],
}

impl BilinearFilter {
    /// A filter with `npass[axis]` passes along each axis. Passes on a
    /// degenerate axis of `dim` are dropped.
    pub fn new(npass: [u32; 3], dim: Dimensionality) -> Self {
        let mut npass = npass;
        for (axis, n) in npass.iter_mut().enumerate() {
            if dim.is_degenerate(axis) {
                *n = 0;
            }
        }
        Self { npass }
    }

    /// Passes per axis.
    pub fn npass(&self) -> [u32; 3] {
        self.npass
    }

    /// Whether the filter leaves every field unchanged.
    pub fn is_identity(&self) -> bool {
        self.npass == [0, 0, 0]
    }

    /// Filtered copy of `src` over its whole storage box.
    pub fn apply(&self, src: &FieldArray<Real>, backend: Backend) -> FieldArray<Real> {
        let mut cur = src.clone();
        for axis in 0..3 {
            for _ in 0..self.npass[axis] {
                let prev = cur.clone();
                let region = prev.storage_box();
                sweep(&mut cur, region, backend, |iv, v| {
                    let mut lo = iv;
                    let mut hi = iv;
                    lo[axis] -= 1;
                    hi[axis] += 1;
                    let left = prev.try_get(lo).unwrap_or(v);
                    let right = prev.try_get(hi).unwrap_or(v);
                    0.25 * left + 0.5 * v + 0.25 * right
                });
            }
        }
        cur
    }

    /// Filtered copy of all six field components.
    pub fn apply_fields(&self, src: &EmFields, backend: Backend) -> EmFields {
        EmFields {
            ex: self.apply(&src.ex, backend),
            ey: self.apply(&src.ey, backend),
            ez: self.apply(&src.ez, backend),
            bx: self.apply(&src.bx, backend),
            by: self.apply(&src.by, backend),
            bz: self.apply(&src.bz, backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corona_mesh::IndexBox;

    fn spike() -> FieldArray<Real> {
        let valid = IndexBox::from_extent([5, 5, 5]).unwrap();
        let mut a = FieldArray::new(valid, [0, 0, 0]).unwrap();
        a.set([2, 2, 2], 1.0);
        a
    }

    #[test]
    fn one_pass_spreads_a_spike() {
        let a = spike();
        let f = BilinearFilter::new([1, 0, 0], Dimensionality::Three).apply(&a, Backend::Sequential);
        assert_eq!(f.get([1, 2, 2]), 0.25);
        assert_eq!(f.get([2, 2, 2]), 0.5);
        assert_eq!(f.get([3, 2, 2]), 0.25);
        assert_eq!(f.get([2, 3, 2]), 0.0);
        assert_eq!(a.get([2, 2, 2]), 1.0);
    }

    #[test]
    fn interior_mass_is_conserved() {
        let a = spike();
        let f = BilinearFilter::new([1, 1, 1], Dimensionality::Three).apply(&a, Backend::Parallel);
        assert!((f.sum_all() - 1.0).abs() < 1e-15);
        assert_eq!(f.get([2, 2, 2]), 0.125);
    }

    #[test]
    fn uniform_field_passes_through() {
        let valid = IndexBox::from_extent([3, 1, 3]).unwrap();
        let a = FieldArray::filled(valid, [1, 0, 1], 4.0).unwrap();
        let f = BilinearFilter::new([2, 2, 2], Dimensionality::XZ).apply(&a, Backend::Sequential);
        assert_eq!(f, a);
    }

    #[test]
    fn degenerate_axis_passes_are_dropped() {
        let f = BilinearFilter::new([1, 3, 2], Dimensionality::XZ);
        assert_eq!(f.npass(), [1, 0, 2]);
        assert!(BilinearFilter::new([0, 5, 0], Dimensionality::XZ).is_identity());
        assert!(!BilinearFilter::new([0, 5, 0], Dimensionality::Three).is_identity());
    }

    #[test]
    fn backends_agree() {
        let valid = IndexBox::from_extent([6, 4, 5]).unwrap();
        let a = FieldArray::from_fn(valid, [2, 2, 2], |iv| {
            ((iv[0] * 31 + iv[1] * 17 + iv[2] * 7) % 13) as Real
        })
        .unwrap();
        let filter = BilinearFilter::new([2, 1, 3], Dimensionality::Three);
        assert_eq!(
            filter.apply(&a, Backend::Sequential),
            filter.apply(&a, Backend::Parallel)
        );
    }
}
