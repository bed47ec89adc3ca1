//! Momentum injectors.

use corona_core::{Backend, InjectorError, Real, Vec3};
use corona_parser::{Expression, LaneSlot};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::arena::{ManagedArena, ManagedBuffer};
use crate::custom::CustomMomentumProfile;

/// Initial momentum per unit mass (`u = gamma * v`) as a function of
/// position.
///
/// Selected once at species initialization and immutable afterwards.
/// Non-random variants ignore the generator passed to
/// [`sample`](InjectorMomentum::sample).
#[derive(Debug)]
pub enum InjectorMomentum {
    /// The same momentum everywhere.
    Constant(Vec3),
    /// Independent normal draws per component.
    Gaussian {
        /// Mean per component.
        mean: Vec3,
        /// Standard deviation per component.
        spread: Vec3,
    },
    /// `u = u_over_r * (x, y, z)`: self-similar expansion.
    RadialExpansion {
        /// Momentum per unit distance from the origin.
        u_over_r: Real,
    },
    /// One compiled user expression per component.
    Parser(Box<[Expression; 3]>),
    /// A registered native profile reading configured coefficients.
    Custom {
        /// The profile function.
        profile: CustomMomentumProfile,
        /// Coefficients, at least `profile.min_params` long.
        params: ManagedBuffer,
    },
}

impl InjectorMomentum {
    /// Build a Gaussian injector. Spreads must be finite and non-negative.
    pub fn gaussian(mean: Vec3, spread: Vec3) -> Result<Self, InjectorError> {
        if let Some(&s) = spread.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(InjectorError::InvalidSpread { spread: s });
        }
        Ok(Self::Gaussian { mean, spread })
    }

    /// Build a parser injector from the three component expressions.
    pub fn parser(ux: Expression, uy: Expression, uz: Expression) -> Self {
        Self::Parser(Box::new([ux, uy, uz]))
    }

    /// Build a custom momentum injector, copying `params` into `arena`.
    pub fn custom(
        arena: &ManagedArena,
        profile: CustomMomentumProfile,
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
            Self::Gaussian { .. } => "gaussian",
            Self::RadialExpansion { .. } => "radial_expansion",
            Self::Parser(_) => "parse_momentum_function",
            Self::Custom { .. } => "custom",
        }
    }

    /// Whether samples depend on the random stream.
    pub fn is_random(&self) -> bool {
        matches!(self, Self::Gaussian { .. })
    }

    /// Momentum at `(x, y, z)` on the host path.
    #[inline]
    pub fn sample(&self, x: Real, y: Real, z: Real, rng: &mut ChaCha8Rng) -> Vec3 {
        match self {
            Self::Constant(u) => *u,
            Self::Gaussian { mean, spread } => [
                mean[0] + spread[0] * box_muller(rng),
                mean[1] + spread[1] * box_muller(rng),
                mean[2] + spread[2] * box_muller(rng),
            ],
            Self::RadialExpansion { u_over_r } => [x * u_over_r, y * u_over_r, z * u_over_r],
            Self::Parser(e) => [
                e[0].evaluate(x, y, z),
                e[1].evaluate(x, y, z),
                e[2].evaluate(x, y, z),
            ],
            Self::Custom { profile, params } => (profile.eval)(params.as_slice(), x, y, z),
        }
    }

    /// Momentum at `(x, y, z)` on the lane path.
    #[inline]
    pub fn sample_in(
        &self,
        slot: &mut LaneSlot,
        x: Real,
        y: Real,
        z: Real,
        rng: &mut ChaCha8Rng,
    ) -> Vec3 {
        match self {
            Self::Parser(e) => [
                e[0].evaluate_in(slot, x, y, z),
                e[1].evaluate_in(slot, x, y, z),
                e[2].evaluate_in(slot, x, y, z),
            ],
            other => other.sample(x, y, z, rng),
        }
    }

    /// Momentum at every position.
    ///
    /// Random variants always draw in position order on the calling
    /// thread so both backends consume `rng` identically.
    ///
    /// # Panics
    ///
    /// If `positions` and `out` differ in length.
    pub fn sample_batch(
        &self,
        backend: Backend,
        positions: &[Vec3],
        out: &mut [Vec3],
        rng: &mut ChaCha8Rng,
    ) {
        assert_eq!(positions.len(), out.len(), "sample_batch: length mismatch");
        if backend == Backend::Sequential || self.is_random() {
            for (o, p) in out.iter_mut().zip(positions) {
                *o = self.sample(p[0], p[1], p[2], rng);
            }
            return;
        }
        // Non-random variants never draw from the per-worker generator.
        out.par_iter_mut().zip(positions.par_iter()).for_each_init(
            || (LaneSlot::new(), ChaCha8Rng::seed_from_u64(0)),
            |(slot, idle), (o, p)| *o = self.sample_in(slot, p[0], p[1], p[2], idle),
        );
    }

    /// Return any managed storage to `arena`. Must be called exactly once
    /// before the injector is discarded.
    pub fn release(self, arena: &ManagedArena) {
        if let Self::Custom { params, .. } = self {
            arena.free(params);
        }
    }
}

/// One standard-normal draw (Box-Muller, cosine branch).
pub fn box_muller(rng: &mut ChaCha8Rng) -> Real {
    let u1: Real = rng.random::<Real>().max(1e-300); // avoid ln(0)
    let u2: Real = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn radial_expansion_scales_position() {
        let m = InjectorMomentum::RadialExpansion { u_over_r: 2.0 };
        assert_eq!(m.sample(1.0, -2.0, 0.5, &mut rng()), [2.0, -4.0, 1.0]);
        assert!(!m.is_random());
    }

    #[test]
    fn gaussian_with_zero_spread_is_the_mean() {
        let m = InjectorMomentum::gaussian([0.1, 0.2, 0.3], [0.0; 3]).unwrap();
        assert_eq!(m.sample(0.0, 0.0, 0.0, &mut rng()), [0.1, 0.2, 0.3]);
    }

    #[test]
    fn gaussian_rejects_negative_spread() {
        assert_eq!(
            InjectorMomentum::gaussian([0.0; 3], [0.1, -0.1, 0.0]).unwrap_err(),
            InjectorError::InvalidSpread { spread: -0.1 }
        );
        assert!(matches!(
            InjectorMomentum::gaussian([0.0; 3], [f64::NAN, 0.0, 0.0]),
            Err(InjectorError::InvalidSpread { spread }) if spread.is_nan()
        ));
    }

    #[test]
    fn gaussian_same_seed_same_stream() {
        let m = InjectorMomentum::gaussian([0.0; 3], [1.0; 3]).unwrap();
        let a = m.sample(0.0, 0.0, 0.0, &mut rng());
        let b = m.sample(0.0, 0.0, 0.0, &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn parser_components() {
        let m = InjectorMomentum::parser(
            Expression::compile("x").unwrap(),
            Expression::compile("2*y").unwrap(),
            Expression::compile("-z").unwrap(),
        );
        let mut slot = LaneSlot::new();
        assert_eq!(m.sample(1.0, 2.0, 3.0, &mut rng()), [1.0, 4.0, -3.0]);
        assert_eq!(m.sample_in(&mut slot, 1.0, 2.0, 3.0, &mut rng()), [1.0, 4.0, -3.0]);
    }

    #[test]
    fn box_muller_is_finite() {
        let mut r = rng();
        for _ in 0..10_000 {
            assert!(box_muller(&mut r).is_finite());
        }
    }
}
