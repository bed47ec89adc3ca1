//! Property tests of the momentum pushers and ionization probabilities.

use corona_core::constants::{C, M_E, Q_E};
use corona_core::{Real, Vec3};
use corona_engine::{element_energies, IonizationModule, PusherAlgo};
use corona_solver::velocity;
use proptest::prelude::*;

fn norm(u: Vec3) -> Real {
    (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt()
}

fn arb_vec(scale: Real) -> impl Strategy<Value = Vec3> {
    prop::array::uniform3(-1.0..1.0f64).prop_map(move |v| v.map(|c| c * scale))
}

proptest! {
    #[test]
    fn pushed_particles_stay_subluminal(
        u in arb_vec(10.0 * C),
        e in arb_vec(1.0e12),
        b in arb_vec(1.0e3),
        dt in 1.0e-17..1.0e-13f64,
    ) {
        for algo in [PusherAlgo::Boris, PusherAlgo::Vay] {
            let out = algo.push_momentum(u, e, b, -Q_E, M_E, dt);
            prop_assert!(out.iter().all(|c| c.is_finite()), "{algo:?}: {out:?}");
            prop_assert!(norm(velocity(out)) < C, "{algo:?}");
        }
    }

    #[test]
    fn boris_rotation_preserves_momentum_magnitude(
        u in arb_vec(3.0 * C),
        b in arb_vec(10.0),
        dt in 1.0e-16..1.0e-12f64,
    ) {
        let out = PusherAlgo::Boris.push_momentum(u, [0.0; 3], b, -Q_E, M_E, dt);
        let n0 = norm(u);
        prop_assert!((norm(out) - n0).abs() <= 1e-12 * n0.max(1.0));
    }

    #[test]
    fn ionization_probability_is_a_probability(
        u in arb_vec(C),
        e in arb_vec(1.0e13),
        b in arb_vec(1.0e4),
        level in 0usize..7,
        dt in 1.0e-18..1.0e-13f64,
    ) {
        let energies = element_energies("N").unwrap();
        let module = IonizationModule::new("n", energies, 0).unwrap();
        let p = module.probability(level, u, e, b, dt);
        prop_assert!((0.0..=1.0).contains(&p), "p = {p}");
    }
}
