//! Field bundles for one mesh partition.

use corona_core::Real;
use corona_mesh::{FieldArray, IndexBox, IntVect, MeshError};

/// Electric and magnetic field components on one partition.
///
/// All six arrays share one layout. Components are collocated on the
/// nodes of the partition's cell box.
#[derive(Clone, Debug, PartialEq)]
pub struct EmFields {
    /// Electric field, x.
    pub ex: FieldArray<Real>,
    /// Electric field, y.
    pub ey: FieldArray<Real>,
    /// Electric field, z.
    pub ez: FieldArray<Real>,
    /// Magnetic field, x.
    pub bx: FieldArray<Real>,
    /// Magnetic field, y.
    pub by: FieldArray<Real>,
    /// Magnetic field, z.
    pub bz: FieldArray<Real>,
}

impl EmFields {
    /// Zero fields over `valid` grown by `ngrow`.
    pub fn zeros(valid: IndexBox, ngrow: IntVect) -> Result<Self, MeshError> {
        let z = FieldArray::new(valid, ngrow)?;
        Ok(Self {
            ex: z.clone(),
            ey: z.clone(),
            ez: z.clone(),
            bx: z.clone(),
            by: z.clone(),
            bz: z,
        })
    }

    /// Fields initialised from `f(iv) -> (E, B)` on every storage cell.
    pub fn from_fn(
        valid: IndexBox,
        ngrow: IntVect,
        f: impl Fn(IntVect) -> ([Real; 3], [Real; 3]),
    ) -> Result<Self, MeshError> {
        Ok(Self {
            ex: FieldArray::from_fn(valid, ngrow, |iv| f(iv).0[0])?,
            ey: FieldArray::from_fn(valid, ngrow, |iv| f(iv).0[1])?,
            ez: FieldArray::from_fn(valid, ngrow, |iv| f(iv).0[2])?,
            bx: FieldArray::from_fn(valid, ngrow, |iv| f(iv).1[0])?,
            by: FieldArray::from_fn(valid, ngrow, |iv| f(iv).1[1])?,
            bz: FieldArray::from_fn(valid, ngrow, |iv| f(iv).1[2])?,
        })
    }

    /// Electric components in x, y, z order.
    pub fn e(&self) -> [&FieldArray<Real>; 3] {
        [&self.ex, &self.ey, &self.ez]
    }

    /// Magnetic components in x, y, z order.
    pub fn b(&self) -> [&FieldArray<Real>; 3] {
        [&self.bx, &self.by, &self.bz]
    }

    /// Layout shared by every component.
    pub fn layout(&self) -> &FieldArray<Real> {
        &self.ex
    }

    /// Confirm that every component shares the layout of `ex`.
    pub fn check_layout(&self) -> Result<(), MeshError> {
        let names = ["ey", "ez", "bx", "by", "bz"];
        let others = [&self.ey, &self.ez, &self.bx, &self.by, &self.bz];
        for (name, arr) in names.iter().zip(others) {
            if !self.ex.same_layout(arr) {
                return Err(MeshError::LayoutMismatch {
                    reason: format!("field component {name} differs from ex"),
                });
            }
        }
        Ok(())
    }
}

/// Current density components on one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentDensity {
    /// Current density, x.
    pub jx: FieldArray<Real>,
    /// Current density, y.
    pub jy: FieldArray<Real>,
    /// Current density, z.
    pub jz: FieldArray<Real>,
}

impl CurrentDensity {
    /// Zero current over `valid` grown by `ngrow`.
    pub fn zeros(valid: IndexBox, ngrow: IntVect) -> Result<Self, MeshError> {
        let z = FieldArray::new(valid, ngrow)?;
        Ok(Self {
            jx: z.clone(),
            jy: z.clone(),
            jz: z,
        })
    }

    /// Zero current over the part of `self`'s storage inside `region`.
    /// See [`FieldArray::zeros_within`].
    pub fn zeros_within(&self, region: IndexBox) -> Self {
        Self {
            jx: self.jx.zeros_within(region),
            jy: self.jy.zeros_within(region),
            jz: self.jz.zeros_within(region),
        }
    }

    /// Reset every component to zero.
    pub fn clear(&mut self) {
        self.jx.fill(0.0);
        self.jy.fill(0.0);
        self.jz.fill(0.0);
    }

    /// Add `other` component-wise over the overlapping storage.
    pub fn accumulate(&mut self, other: &CurrentDensity) {
        self.jx.accumulate(&other.jx);
        self.jy.accumulate(&other.jy);
        self.jz.accumulate(&other.jz);
    }

    /// Components in x, y, z order.
    pub fn components(&self) -> [&FieldArray<Real>; 3] {
        [&self.jx, &self.jy, &self.jz]
    }

    /// Mutable components in x, y, z order.
    pub fn components_mut(&mut self) -> [&mut FieldArray<Real>; 3] {
        [&mut self.jx, &mut self.jy, &mut self.jz]
    }
}
