//! Density injectors.

use corona_core::{Backend, InjectorError, Real, Vec3};
use corona_parser::{Expression, LaneSlot};
use rayon::prelude::*;

use crate::arena::{ManagedArena, ManagedBuffer};
use crate::custom::CustomDensityProfile;

/// Initial number density as a function of position.
///
/// Selected once at species initialization and immutable afterwards.
/// Every variant's [`sample`](InjectorDensity::sample) is allocation-free
/// and cannot fail.
#[derive(Debug)]
pub enum InjectorDensity {
    /// The same density everywhere.
    Constant(Real),
    /// A compiled user expression over `x`, `y`, `z`.
    Parser(Expression),
    /// A registered native profile reading configured coefficients.
    Custom {
        /// The profile function.
        profile: CustomDensityProfile,
        /// Coefficients, at least `profile.min_params` long.
        params: ManagedBuffer,
    },
}

impl InjectorDensity {
    /// Build a custom density injector, copying `params` into `arena`.
    ///
    /// Fails if fewer than `profile.min_params` coefficients are supplied.
    pub fn custom(
        arena: &ManagedArena,
        profile: CustomDensityProfile,
        params: &[Real],
    ) -> Result<Self, InjectorError> {
        if params.len() < profile.min_params {
            return Err(InjectorError::TooFewParameters {
                profile: profile.name,
                needed: profile.min_params,
                got: params.len(),
            });
        }
        Ok(Self::Custom {
            profile,
            params: arena.alloc(params),
        })
    }

    /// Variant name as used in parameter tables.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Constant(_) => "constant",
            Self::Parser(_) => "parse_density_function",
            Self::Custom { .. } => "custom",
        }
    }

    /// Density at `(x, y, z)` on the host path.
    #[inline]
    pub fn sample(&self, x: Real, y: Real, z: Real) -> Real {
        match self {
            Self::Constant(n) => *n,
            Self::Parser(e) => e.evaluate(x, y, z),
            Self::Custom { profile, params } => (profile.eval)(params.as_slice(), x, y, z),
        }
    }

    /// Density at `(x, y, z)` on the lane path.
    #[inline]
    pub fn sample_in(&self, slot: &mut LaneSlot, x: Real, y: Real, z: Real) -> Real {
        match self {
            Self::Parser(e) => e.evaluate_in(slot, x, y, z),
            other => other.sample(x, y, z),
        }
    }

    /// Density at every position.
    ///
    /// # Panics
    ///
    /// If `positions` and `out` differ in length.
    pub fn sample_batch(&self, backend: Backend, positions: &[Vec3], out: &mut [Real]) {
        assert_eq!(positions.len(), out.len(), "sample_batch: length mismatch");
        match backend {
            Backend::Sequential => {
                for (o, p) in out.iter_mut().zip(positions) {
                    *o = self.sample(p[0], p[1], p[2]);
                }
            }
            Backend::Parallel => {
                out.par_iter_mut().zip(positions.par_iter()).for_each_init(
                    LaneSlot::new,
                    |slot, (o, p)| *o = self.sample_in(slot, p[0], p[1], p[2]),
                );
            }
        }
    }

    /// Return any managed storage to `arena`. Must be called exactly once
    /// before the injector is discarded; skipping it leaves the
    /// coefficient buffer allocated in the arena.
    pub fn release(self, arena: &ManagedArena) {
        if let Self::Custom { params, .. } = self {
            arena.free(params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::{PARABOLIC_SLAB, UNIFORM_DENSITY};

    #[test]
    fn constant_ignores_position() {
        let d = InjectorDensity::Constant(3.5);
        assert_eq!(d.sample(0.0, 0.0, 0.0), 3.5);
        assert_eq!(d.sample(-1.0, 7.0, 1e9), 3.5);
        assert_eq!(d.kind(), "constant");
    }

    #[test]
    fn custom_reads_first_coefficient() {
        let arena = ManagedArena::new();
        let d = InjectorDensity::custom(&arena, UNIFORM_DENSITY, &[1e25, 0.5]).unwrap();
        assert_eq!(d.sample(1.0, 2.0, 3.0), 1e25);
        assert_eq!(arena.outstanding(), 1);
        d.release(&arena);
        assert_eq!(arena.outstanding(), 0);
    }

    #[test]
    fn custom_rejects_short_parameter_list() {
        let arena = ManagedArena::new();
        let err = InjectorDensity::custom(&arena, PARABOLIC_SLAB, &[1.0]).unwrap_err();
        assert_eq!(
            err,
            InjectorError::TooFewParameters {
                profile: "parabolic_slab",
                needed: PARABOLIC_SLAB.min_params,
                got: 1,
            }
        );
        assert_eq!(arena.outstanding(), 0);
    }

    #[test]
    fn parser_lane_path_matches_host() {
        let d = InjectorDensity::Parser(Expression::compile("1 + x*y - z").unwrap());
        let mut slot = LaneSlot::new();
        assert_eq!(d.sample(2.0, 3.0, 1.0), 6.0);
        assert_eq!(d.sample_in(&mut slot, 2.0, 3.0, 1.0), 6.0);
    }
}
