//! Field ionization with the ADK tunnelling rate.
//!
//! For each ionization level `i` with energy `U_i` (eV) the rate in a
//! rest-frame field `E` is
//!
//! ```text
//! w_i(E) = prefactor_i * E^power_i * exp(exp_prefactor_i / E)
//! ```
//!
//! The three coefficients are computed once per species. During a step a
//! particle at level `i` below the atomic number ionizes with probability
//! `1 - exp(-w_i dt / gamma)`.

use std::ops::Range;

use corona_core::constants::{ALPHA, C, M_E, Q_E, R_E};
use corona_core::{ConfigError, Real, RealComp, Vec3};
use corona_particles::ParticleTile;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Ionization energy of hydrogen, in eV.
pub const HYDROGEN_IONIZATION_EV: Real = 13.598_434_005_136;

/// Built-in ionization energy tables (eV), by element symbol.
const ELEMENTS: &[(&str, &[Real])] = &[
    ("H", &[13.598_434_005_136]),
    ("He", &[24.587_387_936, 54.417_763_110]),
    ("C", &[11.260_3, 24.383_5, 47.888_7, 64.493_8, 392.090, 489.993]),
    (
        "N",
        &[14.534_1, 29.601_3, 47.445_30, 77.473_5, 97.890_2, 552.067_3, 667.046],
    ),
    (
        "O",
        &[13.618_06, 35.121_1, 54.935_5, 77.413_5, 113.899_0, 138.119_7, 739.29, 871.409_5],
    ),
];

/// Ionization energies of `symbol`, if it has a built-in table.
pub fn element_energies(symbol: &str) -> Option<&'static [Real]> {
    ELEMENTS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, e)| *e)
}

/// Precomputed ADK coefficients for one species.
#[derive(Clone, Debug, PartialEq)]
pub struct IonizationModule {
    initial_level: i32,
    adk_power: Vec<Real>,
    adk_prefactor: Vec<Real>,
    adk_exp_prefactor: Vec<Real>,
}

impl IonizationModule {
    /// Coefficients for the energy table `energies` (eV, one per level).
    ///
    /// An empty table is a configuration error; so is an initial level at
    /// or beyond the atomic number, or a non-positive energy.
    pub fn new(species: &str, energies: &[Real], initial_level: u32) -> Result<Self, ConfigError> {
        if energies.is_empty() {
            return Err(ConfigError::EmptyIonizationTable {
                species: species.to_string(),
            });
        }
        if let Some(bad) = energies.iter().find(|e| !(e.is_finite() && **e > 0.0)) {
            return Err(ConfigError::InvalidParameter {
                species: species.to_string(),
                parameter: "ionization_energies".to_string(),
                reason: format!("every energy must be finite and > 0, got {bad}"),
            });
        }
        if initial_level as usize >= energies.len() {
            return Err(ConfigError::InvalidParameter {
                species: species.to_string(),
                parameter: "ionization_initial_level".to_string(),
                reason: format!(
                    "{initial_level} is not below the atomic number {}",
                    energies.len()
                ),
            });
        }

        let wa = ALPHA.powi(3) * C / R_E;
        let ea = M_E * C * C / Q_E * ALPHA.powi(4) / R_E;
        let uh = HYDROGEN_IONIZATION_EV;
        let l_eff = (uh / energies[0]).sqrt() - 1.0;

        let n = energies.len();
        let mut adk_power = Vec::with_capacity(n);
        let mut adk_prefactor = Vec::with_capacity(n);
        let mut adk_exp_prefactor = Vec::with_capacity(n);
        for (i, &ui) in energies.iter().enumerate() {
            let n_eff = (i as Real + 1.0) * (uh / ui).sqrt();
            let c2 = Real::powf(2.0, 2.0 * n_eff)
                / (n_eff * gamma(n_eff + l_eff + 1.0) * gamma(n_eff - l_eff));
            let ratio = ui / uh;
            adk_power.push(-(2.0 * n_eff - 1.0));
            adk_prefactor.push(
                wa * c2 * ui / (2.0 * uh) * (2.0 * ratio.powf(1.5) * ea).powf(2.0 * n_eff - 1.0),
            );
            adk_exp_prefactor.push(-2.0 / 3.0 * ratio.powf(1.5) * ea);
        }

        Ok(Self {
            initial_level: initial_level as i32,
            adk_power,
            adk_prefactor,
            adk_exp_prefactor,
        })
    }

    /// Level every injected particle starts at.
    pub fn initial_level(&self) -> i32 {
        self.initial_level
    }

    /// Number of levels; a particle at this level is fully stripped.
    pub fn atomic_number(&self) -> i32 {
        self.adk_power.len() as i32
    }

    /// `(power, prefactor, exp_prefactor)` of `level`.
    ///
    /// # Panics
    ///
    /// If `level` is outside `0..atomic_number`.
    pub fn coefficients(&self, level: usize) -> (Real, Real, Real) {
        (
            self.adk_power[level],
            self.adk_prefactor[level],
            self.adk_exp_prefactor[level],
        )
    }

    /// ADK rate (1/s) of `level` in a rest-frame field of magnitude `e`.
    pub fn rate(&self, level: usize, e: Real) -> Real {
        if e.is_nan() || e <= 0.0 {
            return 0.0;
        }
        let (power, prefactor, exp_prefactor) = self.coefficients(level);
        prefactor * e.powf(power) * (exp_prefactor / e).exp()
    }

    /// Probability that a particle at `level` with momentum `u` ionizes
    /// within `dt` under lab-frame fields `e` and `b`.
    pub fn probability(&self, level: usize, u: Vec3, e: Vec3, b: Vec3, dt: Real) -> Real {
        let (field, gamma) = rest_frame_field(u, e, b);
        let w = dt / gamma * self.rate(level, field);
        1.0 - (-w).exp()
    }

    /// Stochastically advance the level of every particle in `range`.
    ///
    /// Reads the cached field columns and writes only the integer column
    /// `level_col`. One uniform draw is taken per particle below the
    /// atomic number, in index order. Returns the ascending indices of
    /// the particles that ionized.
    pub fn ionize_tile(
        &self,
        tile: &mut ParticleTile,
        range: Range<usize>,
        level_col: usize,
        rng: &mut ChaCha8Rng,
        dt: Real,
    ) -> Vec<usize> {
        let z = self.atomic_number();
        let mut ionized = Vec::new();
        let levels = tile.int(level_col);
        for i in range {
            let level = levels[i];
            if level >= z {
                continue;
            }
            let p = self.probability(
                level.max(0) as usize,
                tile.momentum(i),
                cached(tile, i, RealComp::Ex),
                cached(tile, i, RealComp::Bx),
                dt,
            );
            if rng.random::<Real>() < p {
                ionized.push(i);
            }
        }
        let levels = tile.int_mut(level_col);
        for &i in &ionized {
            levels[i] += 1;
        }
        ionized
    }
}

fn cached(tile: &ParticleTile, i: usize, first: RealComp) -> Vec3 {
    let first = first.index();
    [
        tile.real(first)[i],
        tile.real(first + 1)[i],
        tile.real(first + 2)[i],
    ]
}

/// Field magnitude in the particle rest frame, and the particle's gamma.
///
/// `E' = gamma * sqrt(|E + v x B|^2 - (v . E)^2 / c^2)`. A negative
/// radicand from round-off yields zero.
pub fn rest_frame_field(u: Vec3, e: Vec3, b: Vec3) -> (Real, Real) {
    let inv_c2 = 1.0 / (C * C);
    let gamma = (1.0 + (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]) * inv_c2).sqrt();
    let v = u.map(|c| c / gamma);
    let f = [
        e[0] + v[1] * b[2] - v[2] * b[1],
        e[1] + v[2] * b[0] - v[0] * b[2],
        e[2] + v[0] * b[1] - v[1] * b[0],
    ];
    let ve = v[0] * e[0] + v[1] * e[1] + v[2] * e[2];
    let radicand = f[0] * f[0] + f[1] * f[1] + f[2] * f[2] - ve * ve * inv_c2;
    (gamma * radicand.max(0.0).sqrt(), gamma)
}

const LANCZOS_G: Real = 7.0;
const LANCZOS: [Real; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Gamma function (Lanczos approximation, reflection below 1/2).
pub fn gamma(x: Real) -> Real {
    use std::f64::consts::PI;
    if x < 0.5 {
        return PI / ((PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let mut a = LANCZOS[0];
    let t = x + LANCZOS_G + 0.5;
    for (i, c) in LANCZOS.iter().enumerate().skip(1) {
        a += c / (x + i as Real);
    }
    (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * a
}

#[cfg(test)]
mod tests {
    use super::*;
    use corona_core::{AttributeMap, IntComp, TileId};
    use rand::SeedableRng;

    #[test]
    fn gamma_matches_known_values() {
        assert!((gamma(5.0) - 24.0).abs() < 1e-10);
        assert!((gamma(0.5) - std::f64::consts::PI.sqrt()).abs() < 1e-12);
        assert!((gamma(0.25) - 3.625_609_908_221_908).abs() < 1e-10);
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = IonizationModule::new("ions", &[], 0).unwrap_err();
        assert_eq!(
            err,
            ConfigError::EmptyIonizationTable {
                species: "ions".into()
            }
        );
    }

    #[test]
    fn initial_level_must_be_below_atomic_number() {
        let err = IonizationModule::new("ions", &[13.6], 1).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { .. }));
    }

    #[test]
    fn hydrogen_rate_is_physical() {
        let m = IonizationModule::new("h", element_energies("H").unwrap(), 0).unwrap();
        assert_eq!(m.atomic_number(), 1);
        // Tunnelling rate of hydrogen at 1e11 V/m is about 2.8e16 /s.
        let w = m.rate(0, 1e11);
        assert!(w > 2.0e16 && w < 3.5e16, "{w}");
        assert!(m.rate(0, 1e10) < 1e-6 * w);
        assert_eq!(m.rate(0, 0.0), 0.0);
    }

    #[test]
    fn probability_grows_with_field() {
        let m = IonizationModule::new("he", element_energies("he").unwrap(), 0).unwrap();
        let p = |ex| m.probability(0, [0.0; 3], [ex, 0.0, 0.0], [0.0; 3], 1e-16);
        assert_eq!(p(0.0), 0.0);
        assert!(p(1e11) < p(3e11));
        assert!(p(3e11) < p(1e12));
        assert!(p(1e12) <= 1.0);
    }

    #[test]
    fn rest_frame_field_of_crossed_drift_vanishes() {
        let b = [0.0, 0.0, 1.0];
        let v = 0.5 * C;
        let g = 1.0 / (1.0 - 0.25_f64).sqrt();
        let (e, gamma) = rest_frame_field([g * v, 0.0, 0.0], [0.0, v, 0.0], b);
        assert!((gamma - g).abs() < 1e-12);
        assert!(e < 1e-6 * v);
    }

    fn ion_tile(n: usize, level: i32, ex: Real) -> (ParticleTile, usize) {
        let mut attrs = AttributeMap::new();
        let col = attrs.add_int(IntComp::IonizationLevel.name()).unwrap();
        let mut t = ParticleTile::new(TileId::new(0, 0, 0), &attrs);
        for _ in 0..n {
            t.push([0.0; 3], [0.0; 3], 1.0);
        }
        t.commit_size();
        t.int_mut(col).fill(level);
        t.soa_mut().ex.fill(ex);
        (t, col)
    }

    #[test]
    fn strong_field_strips_one_level_per_step() {
        let m = IonizationModule::new("n", element_energies("N").unwrap(), 0).unwrap();
        let (mut t, col) = ion_tile(50, 0, 1e13);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ionized = m.ionize_tile(&mut t, 0..50, col, &mut rng, 1e-14);
        assert_eq!(ionized, (0..50).collect::<Vec<_>>());
        assert!(t.int(col).iter().all(|&l| l == 1));
        assert_eq!(t.comp(RealComp::Ux), &[0.0; 50][..]);
    }

    #[test]
    fn fully_stripped_particles_are_left_alone() {
        let m = IonizationModule::new("h", &[HYDROGEN_IONIZATION_EV], 0).unwrap();
        let (mut t, col) = ion_tile(10, 1, 1e14);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(m.ionize_tile(&mut t, 0..10, col, &mut rng, 1e-15).is_empty());
        assert!(t.int(col).iter().all(|&l| l == 1));
    }

    #[test]
    fn zero_field_never_ionizes() {
        let m = IonizationModule::new("he", element_energies("He").unwrap(), 0).unwrap();
        let (mut t, col) = ion_tile(100, 0, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert!(m.ionize_tile(&mut t, 0..100, col, &mut rng, 1e-15).is_empty());
    }

    #[test]
    fn same_seed_same_outcome() {
        let m = IonizationModule::new("h", &[HYDROGEN_IONIZATION_EV], 0).unwrap();
        let run = || {
            let (mut t, col) = ion_tile(200, 0, 6e10);
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            m.ionize_tile(&mut t, 0..200, col, &mut rng, 1e-16);
            t.int(col).to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn returned_indices_are_exactly_the_promoted_particles() {
        let m = IonizationModule::new("h", &[HYDROGEN_IONIZATION_EV], 0).unwrap();
        let (mut t, col) = ion_tile(300, 0, 6e10);
        t.int_mut(col)[7] = 1;
        let snapshot = |t: &ParticleTile| RealComp::ALL.map(|c| t.comp(c).to_vec());
        let before = snapshot(&t);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let ionized = m.ionize_tile(&mut t, 0..300, col, &mut rng, 1e-16);
        assert!(!ionized.is_empty() && ionized.len() < 300);
        assert!(ionized.windows(2).all(|w| w[0] < w[1]));
        assert!(!ionized.contains(&7));
        for (i, &level) in t.int(col).iter().enumerate() {
            let promoted = ionized.binary_search(&i).is_ok();
            assert_eq!(level, i32::from(promoted || i == 7), "particle {i}");
        }
        assert_eq!(snapshot(&t), before);
    }
}
