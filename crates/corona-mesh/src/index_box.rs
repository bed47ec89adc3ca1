//! Inclusive integer cell boxes.

use crate::error::MeshError;

/// Integer cell coordinate `[i, j, k]`.
pub type IntVect = [i32; 3];

/// An axis-aligned box of cells, inclusive on both corners.
///
/// Iteration over [`IndexBox::cells`] runs x fastest, then y, then z,
/// matching the memory layout of [`FieldArray`](crate::FieldArray).
///
/// # Examples
///
/// ```
/// use corona_mesh::IndexBox;
///
/// let b = IndexBox::new([0, 0, 0], [3, 0, 1]).unwrap();
/// assert_eq!(b.size(), [4, 1, 2]);
/// assert_eq!(b.num_cells(), 8);
/// assert!(b.contains([3, 0, 1]));
/// assert!(!b.contains([4, 0, 0]));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexBox {
    lo: IntVect,
    hi: IntVect,
}

impl IndexBox {
    /// Create a box from its corners. Returns `Err(MeshError::EmptyBox)`
    /// if `hi < lo` on any axis.
    pub fn new(lo: IntVect, hi: IntVect) -> Result<Self, MeshError> {
        if (0..3).any(|a| hi[a] < lo[a]) {
            return Err(MeshError::EmptyBox { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// Box covering `n` cells per axis starting at the origin.
    pub fn from_extent(n: [usize; 3]) -> Result<Self, MeshError> {
        let hi = [n[0] as i32 - 1, n[1] as i32 - 1, n[2] as i32 - 1];
        Self::new([0, 0, 0], hi)
    }

    /// The one-cell box `[iv, iv]`.
    pub fn cell(iv: IntVect) -> Self {
        Self { lo: iv, hi: iv }
    }

    /// Lower corner.
    pub fn lo(&self) -> IntVect {
        self.lo
    }

    /// Upper corner (inclusive).
    pub fn hi(&self) -> IntVect {
        self.hi
    }

    /// Number of cells along each axis.
    pub fn size(&self) -> [usize; 3] {
        [
            (self.hi[0] - self.lo[0] + 1) as usize,
            (self.hi[1] - self.lo[1] + 1) as usize,
            (self.hi[2] - self.lo[2] + 1) as usize,
        ]
    }

    /// Total number of cells.
    pub fn num_cells(&self) -> usize {
        let [nx, ny, nz] = self.size();
        nx * ny * nz
    }

    /// Whether `iv` lies inside the box.
    pub fn contains(&self, iv: IntVect) -> bool {
        (0..3).all(|a| iv[a] >= self.lo[a] && iv[a] <= self.hi[a])
    }

    /// Grow the box by `n[a]` cells on both sides of each axis.
    pub fn grow(&self, n: IntVect) -> Self {
        Self {
            lo: [self.lo[0] - n[0], self.lo[1] - n[1], self.lo[2] - n[2]],
            hi: [self.hi[0] + n[0], self.hi[1] + n[1], self.hi[2] + n[2]],
        }
    }

    /// Intersection with another box, or `None` if they are disjoint.
    pub fn intersect(&self, other: &IndexBox) -> Option<Self> {
        let lo = [
            self.lo[0].max(other.lo[0]),
            self.lo[1].max(other.lo[1]),
            self.lo[2].max(other.lo[2]),
        ];
        let hi = [
            self.hi[0].min(other.hi[0]),
            self.hi[1].min(other.hi[1]),
            self.hi[2].min(other.hi[2]),
        ];
        Self::new(lo, hi).ok()
    }

    /// Coarsen by an integer ratio per axis (floor division on both
    /// corners).
    pub fn coarsen(&self, ratio: [i32; 3]) -> Self {
        let f = |v: i32, r: i32| v.div_euclid(r);
        Self {
            lo: [
                f(self.lo[0], ratio[0]),
                f(self.lo[1], ratio[1]),
                f(self.lo[2], ratio[2]),
            ],
            hi: [
                f(self.hi[0], ratio[0]),
                f(self.hi[1], ratio[1]),
                f(self.hi[2], ratio[2]),
            ],
        }
    }

    /// Refine by an integer ratio per axis.
    pub fn refine(&self, ratio: [i32; 3]) -> Self {
        Self {
            lo: [
                self.lo[0] * ratio[0],
                self.lo[1] * ratio[1],
                self.lo[2] * ratio[2],
            ],
            hi: [
                (self.hi[0] + 1) * ratio[0] - 1,
                (self.hi[1] + 1) * ratio[1] - 1,
                (self.hi[2] + 1) * ratio[2] - 1,
            ],
        }
    }

    /// All cells, x fastest.
    pub fn cells(&self) -> impl Iterator<Item = IntVect> + '_ {
        let (lo, hi) = (self.lo, self.hi);
        (lo[2]..=hi[2]).flat_map(move |k| {
            (lo[1]..=hi[1]).flat_map(move |j| (lo[0]..=hi[0]).map(move |i| [i, j, k]))
        })
    }
}
