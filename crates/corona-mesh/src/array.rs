//! Per-partition cell arrays with ghost cells.

use std::ops::AddAssign;

use crate::error::MeshError;
use crate::index_box::{IndexBox, IntVect};

/// A dense array over one mesh partition plus `ngrow` ghost cells per
/// side.
///
/// Storage is x-fastest over the grown box. Ghost values are owned by the
/// surrounding runtime, which fills them before any gather reads this
/// array.
///
/// Indexing outside the storage box is an invariant violation and panics;
/// use [`FieldArray::try_get`] where an out-of-box lookup is legal.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldArray<T> {
    valid: IndexBox,
    ngrow: IntVect,
    storage: IndexBox,
    data: Vec<T>,
}

/// Integer per-cell mask. Nonzero marks a buffer cell.
pub type MaskArray = FieldArray<i32>;

impl<T: Copy + Default> FieldArray<T> {
    /// Zero-initialised array over `valid` grown by `ngrow`.
    pub fn new(valid: IndexBox, ngrow: IntVect) -> Result<Self, MeshError> {
        Self::filled(valid, ngrow, T::default())
    }

    /// Array over `valid` grown by `ngrow`, every cell set to `value`.
    pub fn filled(valid: IndexBox, ngrow: IntVect, value: T) -> Result<Self, MeshError> {
        if ngrow.iter().any(|&g| g < 0) {
            return Err(MeshError::NegativeGhostWidth { ngrow });
        }
        let storage = valid.grow(ngrow);
        Ok(Self {
            valid,
            ngrow,
            storage,
            data: vec![value; storage.num_cells()],
        })
    }

    /// Array whose every storage cell (ghosts included) is `f(iv)`.
    pub fn from_fn(
        valid: IndexBox,
        ngrow: IntVect,
        mut f: impl FnMut(IntVect) -> T,
    ) -> Result<Self, MeshError> {
        let mut out = Self::new(valid, ngrow)?;
        let storage = out.storage;
        for (slot, iv) in out.data.iter_mut().zip(storage.cells()) {
            *slot = f(iv);
        }
        Ok(out)
    }

    /// A zeroed array covering the part of this array's storage that lies
    /// inside `region`, with no ghost cells. When they do not overlap the
    /// result is the single storage cell at the lower corner.
    ///
    /// Used for scratch buffers that [`accumulate`](Self::accumulate)
    /// back into `self`.
    pub fn zeros_within(&self, region: IndexBox) -> Self {
        let storage = self
            .storage
            .intersect(&region)
            .unwrap_or_else(|| IndexBox::cell(self.storage.lo()));
        Self {
            valid: storage,
            ngrow: [0; 3],
            storage,
            data: vec![T::default(); storage.num_cells()],
        }
    }

    /// Box of cells owned by this partition.
    pub fn valid_box(&self) -> IndexBox {
        self.valid
    }

    /// Valid box plus ghost cells.
    pub fn storage_box(&self) -> IndexBox {
        self.storage
    }

    /// Ghost width per axis.
    pub fn ngrow(&self) -> IntVect {
        self.ngrow
    }

    /// Number of storage cells in one z-plane.
    pub fn plane_len(&self) -> usize {
        let [nx, ny, _] = self.storage.size();
        nx * ny
    }

    /// Flat storage index of `iv`.
    ///
    /// # Panics
    ///
    /// If `iv` is outside the storage box.
    pub fn linear_index(&self, iv: IntVect) -> usize {
        match self.offset(iv) {
            Some(i) => i,
            None => panic!(
                "cell {iv:?} outside storage box {:?}..={:?}",
                self.storage.lo(),
                self.storage.hi()
            ),
        }
    }

    /// Cell coordinate of flat storage index `i`.
    pub fn cell_of(&self, i: usize) -> IntVect {
        let [nx, ny, _] = self.storage.size();
        let lo = self.storage.lo();
        [
            lo[0] + (i % nx) as i32,
            lo[1] + ((i / nx) % ny) as i32,
            lo[2] + (i / (nx * ny)) as i32,
        ]
    }

    fn offset(&self, iv: IntVect) -> Option<usize> {
        if !self.storage.contains(iv) {
            return None;
        }
        let lo = self.storage.lo();
        let [nx, ny, _] = self.storage.size();
        let i = (iv[0] - lo[0]) as usize;
        let j = (iv[1] - lo[1]) as usize;
        let k = (iv[2] - lo[2]) as usize;
        Some(i + nx * (j + ny * k))
    }

    /// Value at `iv`. Panics outside the storage box.
    pub fn get(&self, iv: IntVect) -> T {
        self.data[self.linear_index(iv)]
    }

    /// Value at `iv`, or `None` outside the storage box.
    pub fn try_get(&self, iv: IntVect) -> Option<T> {
        self.offset(iv).map(|i| self.data[i])
    }

    /// Overwrite the value at `iv`. Panics outside the storage box.
    pub fn set(&mut self, iv: IntVect, value: T) {
        let i = self.linear_index(iv);
        self.data[i] = value;
    }

    /// Set every storage cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Raw storage, x fastest.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable raw storage, x fastest.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Whether `other` has the same valid box and ghost width.
    pub fn same_layout<U>(&self, other: &FieldArray<U>) -> bool {
        self.valid == other.valid && self.ngrow == other.ngrow
    }
}

impl<T: Copy + Default + AddAssign> FieldArray<T> {
    /// Accumulate `value` into the cell at `iv`. Panics outside the
    /// storage box.
    pub fn add(&mut self, iv: IntVect, value: T) {
        let i = self.linear_index(iv);
        self.data[i] += value;
    }

    /// Accumulate `value` at `iv` if it lies in the storage box. Returns
    /// whether the value was added.
    pub fn try_add(&mut self, iv: IntVect, value: T) -> bool {
        match self.offset(iv) {
            Some(i) => {
                self.data[i] += value;
                true
            }
            None => false,
        }
    }

    /// Add every cell of `other` that overlaps this array's storage box.
    /// Cells of `other` outside the overlap are ignored.
    pub fn accumulate(&mut self, other: &FieldArray<T>) {
        let Some(overlap) = self.storage.intersect(&other.storage) else {
            return;
        };
        for iv in overlap.cells() {
            let v = other.data[other.linear_index(iv)];
            let i = self.linear_index(iv);
            self.data[i] += v;
        }
    }

    /// Sum over the valid box only.
    pub fn sum_valid(&self) -> T {
        let mut acc = T::default();
        for iv in self.valid.cells() {
            acc += self.get(iv);
        }
        acc
    }

    /// Sum over every storage cell, ghosts included.
    pub fn sum_all(&self) -> T {
        let mut acc = T::default();
        for &v in &self.data {
            acc += v;
        }
        acc
    }
}
