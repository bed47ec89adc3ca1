//! Reductions over a species, used for sanity checks and reporting.
//!
//! Every reduction visits tiles in [`TileId`](corona_core::TileId) order
//! and particles in index order, so repeated calls on the same state give
//! the same bits.

use corona_core::{Real, RealComp, Vec3};
use corona_particles::ParticleTile;
use corona_solver::velocity;

use crate::container::ParticleContainer;

/// Total charge carried by the species, `sum(q * w)`, in C.
pub fn sum_particle_charge(pc: &ParticleContainer) -> Real {
    let q = pc.config().charge;
    pc.tiles()
        .map(|t| t.comp(RealComp::W).iter().map(|&w| q * w).sum::<Real>())
        .sum()
}

/// Unweighted mean velocity over every particle, or zero when there are
/// none.
pub fn mean_particle_velocity(pc: &ParticleContainer) -> Vec3 {
    let mut sum = [0.0; 3];
    let mut n = 0usize;
    for t in pc.tiles() {
        for_each_velocity(t, |v| {
            for (s, c) in sum.iter_mut().zip(v) {
                *s += c;
            }
        });
        n += t.len();
    }
    if n == 0 {
        return [0.0; 3];
    }
    sum.map(|s| s / n as Real)
}

/// Largest particle speed `|v|`, or zero when there are no particles.
pub fn max_particle_velocity(pc: &ParticleContainer) -> Real {
    let mut max: Real = 0.0;
    for t in pc.tiles() {
        for_each_velocity(t, |v| {
            max = max.max((v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt());
        });
    }
    max
}

fn for_each_velocity(tile: &ParticleTile, mut f: impl FnMut(Vec3)) {
    for i in 0..tile.len() {
        f(velocity(tile.momentum(i)));
    }
}
