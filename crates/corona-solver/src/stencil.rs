//! Finite-difference time-domain field updates on a nodal grid.
//!
//! Every component is collocated on the cell nodes and advanced with
//! centred second-order differences:
//!
//! ```text
//! B <- B - dt * curl E
//! E <- E + c^2 dt * curl B - mu0 c^2 dt * J
//! ```
//!
//! One function per component computes the new value of a single cell
//! from read-only neighbour access. In [`Dimensionality::XZ`] every y
//! derivative vanishes and no y neighbour is ever read, so arrays on that
//! layout need no ghost cells in y.
//!
//! [`evolve_b`] and [`evolve_e`] apply the kernels over the valid box of a
//! partition. The leapfrog cycle is `evolve_b(dt/2)`, `evolve_e(dt)`,
//! `evolve_b(dt/2)`.

use corona_core::constants::{C, MU0};
use corona_core::{Backend, Real, Vec3};
use corona_mesh::{Dimensionality, FieldArray, IntVect};

use crate::fields::{CurrentDensity, EmFields};
use crate::sweep::sweep;

/// Time-step-scaled difference coefficients for one level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilCoefficients {
    /// `dt / dx` per axis, for the magnetic update.
    pub b: Vec3,
    /// `c^2 dt / dx` per axis, for the electric update.
    pub e: Vec3,
    /// `mu0 c^2 dt`, scaling the current term.
    pub mudt: Real,
}

impl StencilCoefficients {
    /// Coefficients for time step `dt` on cells of size `cell_size`.
    pub fn new(dt: Real, cell_size: Vec3) -> Self {
        let c2 = C * C;
        Self {
            b: cell_size.map(|dx| dt / dx),
            e: cell_size.map(|dx| c2 * dt / dx),
            mudt: MU0 * c2 * dt,
        }
    }
}

/// `f(iv + e_axis) - f(iv - e_axis)`.
#[inline]
fn delta(f: &FieldArray<Real>, iv: IntVect, axis: usize) -> Real {
    let mut up = iv;
    let mut down = iv;
    up[axis] += 1;
    down[axis] -= 1;
    f.get(up) - f.get(down)
}

// ---------------------------------------------------------------------------
// Magnetic components
// ---------------------------------------------------------------------------

/// New `Bx` at `iv`: `dBx/dt = dEy/dz - dEz/dy`.
#[inline]
pub fn push_bx(
    iv: IntVect,
    bx: Real,
    ey: &FieldArray<Real>,
    ez: &FieldArray<Real>,
    k: &StencilCoefficients,
    dim: Dimensionality,
) -> Real {
    match dim {
        Dimensionality::Three => {
            bx - 0.5 * k.b[1] * delta(ez, iv, 1) + 0.5 * k.b[2] * delta(ey, iv, 2)
        }
        Dimensionality::XZ => bx + 0.5 * k.b[2] * delta(ey, iv, 2),
    }
}

/// New `By` at `iv`: `dBy/dt = dEz/dx - dEx/dz`.
#[inline]
pub fn push_by(
    iv: IntVect,
    by: Real,
    ex: &FieldArray<Real>,
    ez: &FieldArray<Real>,
    k: &StencilCoefficients,
    _dim: Dimensionality,
) -> Real {
    by + 0.5 * k.b[0] * delta(ez, iv, 0) - 0.5 * k.b[2] * delta(ex, iv, 2)
}

/// New `Bz` at `iv`: `dBz/dt = dEx/dy - dEy/dx`.
#[inline]
pub fn push_bz(
    iv: IntVect,
    bz: Real,
    ex: &FieldArray<Real>,
    ey: &FieldArray<Real>,
    k: &StencilCoefficients,
    dim: Dimensionality,
) -> Real {
    match dim {
        Dimensionality::Three => {
            bz - 0.5 * k.b[0] * delta(ey, iv, 0) + 0.5 * k.b[1] * delta(ex, iv, 1)
        }
        Dimensionality::XZ => bz - 0.5 * k.b[0] * delta(ey, iv, 0),
    }
}

// ---------------------------------------------------------------------------
// Electric components
// ---------------------------------------------------------------------------

/// New `Ex` at `iv`: `dEx/dt = c^2 (dBz/dy - dBy/dz) - mu0 c^2 jx`.
#[inline]
pub fn push_ex(
    iv: IntVect,
    ex: Real,
    by: &FieldArray<Real>,
    bz: &FieldArray<Real>,
    jx: Real,
    k: &StencilCoefficients,
    dim: Dimensionality,
) -> Real {
    let curl = match dim {
        Dimensionality::Three => {
            0.5 * k.e[1] * delta(bz, iv, 1) - 0.5 * k.e[2] * delta(by, iv, 2)
        }
        Dimensionality::XZ => -0.5 * k.e[2] * delta(by, iv, 2),
    };
    ex + curl - k.mudt * jx
}

/// New `Ey` at `iv`: `dEy/dt = c^2 (dBx/dz - dBz/dx) - mu0 c^2 jy`.
#[inline]
pub fn push_ey(
    iv: IntVect,
    ey: Real,
    bx: &FieldArray<Real>,
    bz: &FieldArray<Real>,
    jy: Real,
    k: &StencilCoefficients,
    _dim: Dimensionality,
) -> Real {
    ey - 0.5 * k.e[0] * delta(bz, iv, 0) + 0.5 * k.e[2] * delta(bx, iv, 2) - k.mudt * jy
}

/// New `Ez` at `iv`: `dEz/dt = c^2 (dBy/dx - dBx/dy) - mu0 c^2 jz`.
#[inline]
pub fn push_ez(
    iv: IntVect,
    ez: Real,
    bx: &FieldArray<Real>,
    by: &FieldArray<Real>,
    jz: Real,
    k: &StencilCoefficients,
    dim: Dimensionality,
) -> Real {
    let curl = match dim {
        Dimensionality::Three => {
            0.5 * k.e[0] * delta(by, iv, 0) - 0.5 * k.e[1] * delta(bx, iv, 1)
        }
        Dimensionality::XZ => 0.5 * k.e[0] * delta(by, iv, 0),
    };
    ez + curl - k.mudt * jz
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Advance the magnetic field by the step encoded in `k` over the valid
/// box. Ghost cells of `E` must be current.
pub fn evolve_b(
    fields: &mut EmFields,
    k: &StencilCoefficients,
    dim: Dimensionality,
    backend: Backend,
) {
    let EmFields {
        ex,
        ey,
        ez,
        bx,
        by,
        bz,
    } = fields;
    let (ex, ey, ez) = (&*ex, &*ey, &*ez);
    let valid = bx.valid_box();
    sweep(bx, valid, backend, |iv, v| push_bx(iv, v, ey, ez, k, dim));
    sweep(by, valid, backend, |iv, v| push_by(iv, v, ex, ez, k, dim));
    sweep(bz, valid, backend, |iv, v| push_bz(iv, v, ex, ey, k, dim));
}

/// Advance the electric field by the step encoded in `k` over the valid
/// box, subtracting the current term. Ghost cells of `B` must be current.
///
/// # Panics
///
/// If `j` does not cover the valid box of the fields.
pub fn evolve_e(
    fields: &mut EmFields,
    j: &CurrentDensity,
    k: &StencilCoefficients,
    dim: Dimensionality,
    backend: Backend,
) {
    let EmFields {
        ex,
        ey,
        ez,
        bx,
        by,
        bz,
    } = fields;
    let (bx, by, bz) = (&*bx, &*by, &*bz);
    let valid = ex.valid_box();
    sweep(ex, valid, backend, |iv, v| {
        push_ex(iv, v, by, bz, j.jx.get(iv), k, dim)
    });
    sweep(ey, valid, backend, |iv, v| {
        push_ey(iv, v, bx, bz, j.jy.get(iv), k, dim)
    });
    sweep(ez, valid, backend, |iv, v| {
        push_ez(iv, v, bx, by, j.jz.get(iv), k, dim)
    });
}
