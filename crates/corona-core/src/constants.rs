//! Mathematical and physical constants (SI, 2018 CODATA).

use crate::Real;

/// Pi.
pub const PI: Real = std::f64::consts::PI;

/// Speed of light in vacuum (m/s).
pub const C: Real = 299_792_458.0;
/// Vacuum permittivity (F/m).
pub const EP0: Real = 8.854_187_812_8e-12;
/// Vacuum permeability (H/m).
pub const MU0: Real = 1.256_637_062_12e-6;
/// Elementary charge (C).
pub const Q_E: Real = 1.602_176_634e-19;
/// Electron mass (kg).
pub const M_E: Real = 9.109_383_701_5e-31;
/// Proton mass (kg).
pub const M_P: Real = 1.672_621_923_69e-27;
/// Reduced Planck constant (J s).
pub const HBAR: Real = 1.054_571_817e-34;
/// Fine-structure constant.
pub const ALPHA: Real = MU0 / (4.0 * PI) * Q_E * Q_E * C / HBAR;
/// Classical electron radius (m).
pub const R_E: Real = 1.0 / (4.0 * PI * EP0) * Q_E * Q_E / (M_E * C * C);
