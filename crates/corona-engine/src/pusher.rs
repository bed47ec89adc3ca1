//! Relativistic particle pushers.
//!
//! Momentum is stored as `u = gamma v` (momentum per unit mass). Both
//! integrators advance `u` over a full step using the gathered `E` and
//! `B`, after which positions advance with the new velocity.

use std::ops::Range;

use corona_core::constants::C;
use corona_core::{Real, Vec3};
use corona_mesh::Dimensionality;
use corona_particles::ParticleTile;

/// Momentum integrator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PusherAlgo {
    /// Boris rotation.
    #[default]
    Boris,
    /// Vay's scheme, exact for `E + v x B = 0`.
    Vay,
}

impl PusherAlgo {
    /// Parameter-table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boris => "boris",
            Self::Vay => "vay",
        }
    }

    /// Inverse of [`PusherAlgo::name`], case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "boris" => Some(Self::Boris),
            "vay" => Some(Self::Vay),
            _ => None,
        }
    }

    /// Advance `u` by `dt` under fields `e`, `b` for charge-to-mass ratio
    /// `q / m`.
    #[inline]
    pub fn push_momentum(self, u: Vec3, e: Vec3, b: Vec3, q: Real, m: Real, dt: Real) -> Vec3 {
        match self {
            Self::Boris => boris(u, e, b, q, m, dt),
            Self::Vay => vay(u, e, b, q, m, dt),
        }
    }
}

#[inline]
fn inv_gamma(u: Vec3) -> Real {
    1.0 / (1.0 + (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]) / (C * C)).sqrt()
}

/// Boris push: half electric kick, magnetic rotation, half electric kick.
pub fn boris(u: Vec3, e: Vec3, b: Vec3, q: Real, m: Real, dt: Real) -> Vec3 {
    let econst = 0.5 * q * dt / m;
    let [mut ux, mut uy, mut uz] = u;
    ux += econst * e[0];
    uy += econst * e[1];
    uz += econst * e[2];

    let ig = inv_gamma([ux, uy, uz]);
    let t = [econst * ig * b[0], econst * ig * b[1], econst * ig * b[2]];
    let tsqi = 2.0 / (1.0 + t[0] * t[0] + t[1] * t[1] + t[2] * t[2]);
    let s = [t[0] * tsqi, t[1] * tsqi, t[2] * tsqi];

    let uxp = ux + uy * t[2] - uz * t[1];
    let uyp = uy + uz * t[0] - ux * t[2];
    let uzp = uz + ux * t[1] - uy * t[0];

    ux += uyp * s[2] - uzp * s[1];
    uy += uzp * s[0] - uxp * s[2];
    uz += uxp * s[1] - uyp * s[0];

    [ux + econst * e[0], uy + econst * e[1], uz + econst * e[2]]
}

/// Vay push.
pub fn vay(u: Vec3, e: Vec3, b: Vec3, q: Real, m: Real, dt: Real) -> Vec3 {
    let econst = q * dt / m;
    let bconst = 0.5 * q * dt / m;
    let inv_c = 1.0 / C;
    let inv_c2 = inv_c * inv_c;

    let ig = inv_gamma(u);
    let v = [u[0] * ig, u[1] * ig, u[2] * ig];
    let tau = [bconst * b[0], bconst * b[1], bconst * b[2]];
    let tausq = tau[0] * tau[0] + tau[1] * tau[1] + tau[2] * tau[2];

    let upr = [
        u[0] + econst * e[0] + (v[1] * b[2] - v[2] * b[1]) * bconst,
        u[1] + econst * e[1] + (v[2] * b[0] - v[0] * b[2]) * bconst,
        u[2] + econst * e[2] + (v[0] * b[1] - v[1] * b[0]) * bconst,
    ];
    let gprsq = 1.0 + (upr[0] * upr[0] + upr[1] * upr[1] + upr[2] * upr[2]) * inv_c2;
    let ust = (upr[0] * tau[0] + upr[1] * tau[1] + upr[2] * tau[2]) * inv_c;

    let sigma = gprsq - tausq;
    let gisq = 2.0 / (sigma + (sigma * sigma + 4.0 * (tausq + ust * ust)).sqrt());
    let bg = bconst * gisq.sqrt();
    let t = [bg * b[0], bg * b[1], bg * b[2]];
    let s = 1.0 / (1.0 + tausq * gisq);
    let tu = t[0] * upr[0] + t[1] * upr[1] + t[2] * upr[2];

    [
        s * (upr[0] + t[0] * tu + upr[1] * t[2] - upr[2] * t[1]),
        s * (upr[1] + t[1] * tu + upr[2] * t[0] - upr[0] * t[2]),
        s * (upr[2] + t[2] * tu + upr[0] * t[1] - upr[1] * t[0]),
    ]
}

/// Advance `pos` by `dt` with the velocity of `u`. The degenerate axis of
/// an x–z layout does not move.
#[inline]
pub fn update_position(pos: Vec3, u: Vec3, dt: Real, dim: Dimensionality) -> Vec3 {
    let ig = inv_gamma(u);
    let mut out = pos;
    for a in 0..3 {
        if !dim.is_degenerate(a) {
            out[a] += u[a] * ig * dt;
        }
    }
    out
}

/// Push momentum then position for particles in `range`, reading the
/// cached field columns.
pub fn push_tile(
    tile: &mut ParticleTile,
    range: Range<usize>,
    algo: PusherAlgo,
    q: Real,
    m: Real,
    dt: Real,
    dim: Dimensionality,
) {
    let s = tile.soa_mut();
    for i in range {
        let u = algo.push_momentum(
            [s.ux[i], s.uy[i], s.uz[i]],
            [s.ex[i], s.ey[i], s.ez[i]],
            [s.bx[i], s.by[i], s.bz[i]],
            q,
            m,
            dt,
        );
        let p = update_position([s.x[i], s.y[i], s.z[i]], u, dt, dim);
        [s.ux[i], s.uy[i], s.uz[i]] = u;
        [s.x[i], s.y[i], s.z[i]] = p;
    }
}

/// Advance positions only, leaving momentum untouched.
pub fn push_positions(tile: &mut ParticleTile, dt: Real, dim: Dimensionality) {
    let n = tile.len();
    let s = tile.soa_mut();
    for i in 0..n {
        let p = update_position([s.x[i], s.y[i], s.z[i]], [s.ux[i], s.uy[i], s.uz[i]], dt, dim);
        [s.x[i], s.y[i], s.z[i]] = p;
    }
}
