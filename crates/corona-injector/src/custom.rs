//! User-registered native profiles.
//!
//! A custom profile is a plain function pointer plus the minimum number
//! of coefficients it reads. Coefficients come from the species
//! configuration (`custom_profile_params`, `custom_momentum_params`) and
//! are stored in a [`ManagedBuffer`](crate::ManagedBuffer) at construction.
//! The function must not allocate or panic for any buffer at least
//! `min_params` long.

use corona_core::{Real, Vec3};
use indexmap::IndexMap;

/// Native density profile.
#[derive(Clone, Copy, Debug)]
pub struct CustomDensityProfile {
    /// Registry name.
    pub name: &'static str,
    /// Minimum coefficient count the function reads.
    pub min_params: usize,
    /// `f(params, x, y, z) -> density`.
    pub eval: fn(&[Real], Real, Real, Real) -> Real,
}

/// Native momentum profile.
#[derive(Clone, Copy, Debug)]
pub struct CustomMomentumProfile {
    /// Registry name.
    pub name: &'static str,
    /// Minimum coefficient count the function reads.
    pub min_params: usize,
    /// `f(params, x, y, z) -> u`.
    pub eval: fn(&[Real], Real, Real, Real) -> Vec3,
}

fn uniform_density(p: &[Real], _x: Real, _y: Real, _z: Real) -> Real {
    p[0]
}

fn uniform_momentum(p: &[Real], _x: Real, _y: Real, _z: Real) -> Vec3 {
    [p[0], p[1], p[2]]
}

/// `p[0] * max(0, 1 - ((z - p[1]) / p[2])^2)`: a parabolic slab along z.
fn parabolic_slab(p: &[Real], _x: Real, _y: Real, z: Real) -> Real {
    let s = (z - p[1]) / p[2];
    p[0] * (1.0 - s * s).max(0.0)
}

/// Uniform density `p[0]`.
pub const UNIFORM_DENSITY: CustomDensityProfile = CustomDensityProfile {
    name: "default",
    min_params: 1,
    eval: uniform_density,
};

/// Parabolic slab centred at `z = p[1]` with half-width `p[2]`.
pub const PARABOLIC_SLAB: CustomDensityProfile = CustomDensityProfile {
    name: "parabolic_slab",
    min_params: 3,
    eval: parabolic_slab,
};

/// Uniform momentum `(p[0], p[1], p[2])`.
pub const UNIFORM_MOMENTUM: CustomMomentumProfile = CustomMomentumProfile {
    name: "default",
    min_params: 3,
    eval: uniform_momentum,
};

/// Name → profile registry consulted when a species selects a custom
/// injector.
#[derive(Clone, Debug)]
pub struct CustomProfiles {
    density: IndexMap<&'static str, CustomDensityProfile>,
    momentum: IndexMap<&'static str, CustomMomentumProfile>,
}

impl CustomProfiles {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            density: IndexMap::new(),
            momentum: IndexMap::new(),
        }
    }

    /// Register a density profile, replacing any of the same name.
    pub fn register_density(&mut self, profile: CustomDensityProfile) -> &mut Self {
        self.density.insert(profile.name, profile);
        self
    }

    /// Register a momentum profile, replacing any of the same name.
    pub fn register_momentum(&mut self, profile: CustomMomentumProfile) -> &mut Self {
        self.momentum.insert(profile.name, profile);
        self
    }

    /// Look up a density profile.
    pub fn density(&self, name: &str) -> Option<CustomDensityProfile> {
        self.density.get(name).copied()
    }

    /// Look up a momentum profile.
    pub fn momentum(&self, name: &str) -> Option<CustomMomentumProfile> {
        self.momentum.get(name).copied()
    }

    /// Registered density profile names.
    pub fn density_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.density.keys().copied()
    }

    /// Registered momentum profile names.
    pub fn momentum_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.momentum.keys().copied()
    }
}

impl Default for CustomProfiles {
    /// The built-in profiles.
    fn default() -> Self {
        let mut r = Self::empty();
        r.register_density(UNIFORM_DENSITY)
            .register_density(PARABOLIC_SLAB)
            .register_momentum(UNIFORM_MOMENTUM);
        r
    }
}
