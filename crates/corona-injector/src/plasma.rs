//! Plasma injection: where particles are placed and what they carry.

use corona_core::constants::C;
use corona_core::{ConfigError, InjectorError, ParameterTable, Real, Vec3};
use corona_parser::{Constants, Expression};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::arena::ManagedArena;
use crate::constants::{compile, expression_constants, get_constant, require_constant};
use crate::custom::CustomProfiles;
use crate::density::InjectorDensity;
use crate::momentum::InjectorMomentum;

/// How particles are laid out inside each cell.
#[derive(Clone, Debug, PartialEq)]
pub enum InjectionStyle {
    /// A regular `nx × ny × nz` lattice per cell, at sub-cell centres.
    NUniformPerCell([u32; 3]),
    /// `n` particles per cell at uniformly random offsets.
    NRandomPerCell(u32),
    /// One particle at a fixed position with a fixed weight. The density
    /// injector is not consulted.
    SingleParticle {
        /// Position.
        position: Vec3,
        /// Statistical weight.
        weight: Real,
    },
}

impl InjectionStyle {
    /// Particles per cell, or 0 for the single-particle style.
    pub fn particles_per_cell(&self) -> usize {
        match self {
            Self::NUniformPerCell(n) => n.iter().map(|&v| v as usize).product(),
            Self::NRandomPerCell(n) => *n as usize,
            Self::SingleParticle { .. } => 0,
        }
    }
}

/// Axis-aligned region particles are injected into, `lo <= p < hi`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlasmaBounds {
    /// Lower bound per axis.
    pub lo: Vec3,
    /// Upper bound per axis (exclusive).
    pub hi: Vec3,
}

impl PlasmaBounds {
    /// The whole of space.
    pub const UNBOUNDED: Self = Self {
        lo: [Real::NEG_INFINITY; 3],
        hi: [Real::INFINITY; 3],
    };

    /// Whether `p` lies inside.
    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|a| p[a] >= self.lo[a] && p[a] < self.hi[a])
    }
}

/// Everything needed to populate a species at initialization.
#[derive(Debug)]
pub struct PlasmaInjector {
    /// Particle placement.
    pub style: InjectionStyle,
    /// Injection region.
    pub bounds: PlasmaBounds,
    /// Density profile.
    pub density: InjectorDensity,
    /// Momentum profile.
    pub momentum: InjectorMomentum,
    /// Positions whose density falls below this are skipped.
    pub density_min: Real,
    /// Densities above this are clipped to it.
    pub density_max: Real,
}

const STYLES: &str = "nuniformpercell, nrandompercell, singleparticle";
const DENSITY_PROFILES: &str = "constant, parse_density_function, custom";
const MOMENTUM_TYPES: &str =
    "constant, gaussian, radial_expansion, parse_momentum_function, custom";

impl PlasmaInjector {
    /// Fractional in-cell offsets for one cell, appended to `out`.
    ///
    /// Uniform lattices place particle `(i, j, k)` at
    /// `((i + 0.5) / nx, (j + 0.5) / ny, (k + 0.5) / nz)`.
    pub fn cell_offsets(&self, rng: &mut ChaCha8Rng, out: &mut Vec<Vec3>) {
        match &self.style {
            InjectionStyle::NUniformPerCell([nx, ny, nz]) => {
                for k in 0..*nz {
                    for j in 0..*ny {
                        for i in 0..*nx {
                            out.push([
                                (i as Real + 0.5) / *nx as Real,
                                (j as Real + 0.5) / *ny as Real,
                                (k as Real + 0.5) / *nz as Real,
                            ]);
                        }
                    }
                }
            }
            InjectionStyle::NRandomPerCell(n) => {
                for _ in 0..*n {
                    out.push([rng.random(), rng.random(), rng.random()]);
                }
            }
            InjectionStyle::SingleParticle { .. } => {}
        }
    }

    /// Density to inject at `p`, or `None` if the position is skipped.
    ///
    /// Non-finite and negative densities count as zero. Zero and
    /// below-minimum densities are skipped; densities above the maximum
    /// are clipped.
    #[inline]
    pub fn density_at(&self, p: Vec3) -> Option<Real> {
        self.clip_density(self.density.sample(p[0], p[1], p[2]))
    }

    /// Apply the skip and clipping rules of [`density_at`](Self::density_at)
    /// to an already sampled value.
    #[inline]
    pub fn clip_density(&self, raw: Real) -> Option<Real> {
        let n = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
        if n <= 0.0 || n < self.density_min {
            return None;
        }
        Some(n.min(self.density_max))
    }

    /// Release managed storage held by either injector.
    pub fn release(self, arena: &ManagedArena) {
        self.density.release(arena);
        self.momentum.release(arena);
    }

    /// Read the injector of `species` from `table`.
    ///
    /// Expressions are compiled here, so malformed text is reported before
    /// any particle is created.
    pub fn from_table(
        table: &ParameterTable,
        species: &str,
        arena: &ManagedArena,
        profiles: &CustomProfiles,
    ) -> Result<Self, ConfigError> {
        let constants = expression_constants(table)?;
        let style = read_style(table, species, &constants)?;

        let mut bounds = PlasmaBounds::UNBOUNDED;
        for (a, axis) in ["x", "y", "z"].iter().enumerate() {
            if let Some(v) = get_constant(table, species, &format!("{axis}min"), &constants)? {
                bounds.lo[a] = v;
            }
            if let Some(v) = get_constant(table, species, &format!("{axis}max"), &constants)? {
                bounds.hi[a] = v;
            }
        }

        let density_min = get_constant(table, species, "density_min", &constants)?.unwrap_or(0.0);
        let density_max =
            get_constant(table, species, "density_max", &constants)?.unwrap_or(Real::INFINITY);
        if density_max < density_min {
            return Err(invalid(
                species,
                "density_max",
                format!("{density_max} is below density_min {density_min}"),
            ));
        }

        // Managed buffers are allocated last so an error above leaks nothing.
        let density = match style {
            InjectionStyle::SingleParticle { .. } => InjectorDensity::Constant(0.0),
            _ => read_density(table, species, arena, profiles, &constants)?,
        };
        let momentum = match read_momentum(table, species, arena, profiles, &constants, &style) {
            Ok(m) => m,
            Err(e) => {
                density.release(arena);
                return Err(e);
            }
        };

        tracing::debug!(
            species,
            density = density.kind(),
            momentum = momentum.kind(),
            ppc = style.particles_per_cell(),
            "plasma injector configured"
        );
        Ok(Self {
            style,
            bounds,
            density,
            momentum,
            density_min,
            density_max,
        })
    }
}

fn injector(species: &str, parameter: &str, source: InjectorError) -> ConfigError {
    ConfigError::Injector {
        species: species.to_string(),
        parameter: parameter.to_string(),
        source,
    }
}

fn invalid(species: &str, parameter: &str, reason: String) -> ConfigError {
    ConfigError::InvalidParameter {
        species: species.to_string(),
        parameter: parameter.to_string(),
        reason,
    }
}

fn unknown(species: &str, parameter: &str, value: &str, allowed: &'static str) -> ConfigError {
    ConfigError::UnknownVariant {
        species: species.to_string(),
        parameter: parameter.to_string(),
        value: value.to_string(),
        allowed,
    }
}

fn read_vec3(
    table: &ParameterTable,
    species: &str,
    parameter: &str,
) -> Result<Vec3, ConfigError> {
    let v = table
        .get_reals(species, parameter)?
        .ok_or_else(|| ConfigError::MissingParameter {
            species: species.to_string(),
            parameter: parameter.to_string(),
        })?;
    match v[..] {
        [a, b, c] => Ok([a, b, c]),
        _ => Err(invalid(species, parameter, format!("expected 3 values, got {}", v.len()))),
    }
}

fn read_style(
    table: &ParameterTable,
    species: &str,
    constants: &Constants,
) -> Result<InjectionStyle, ConfigError> {
    let name = table.require_str(species, "injection_style")?;
    match name.to_ascii_lowercase().as_str() {
        "nuniformpercell" => {
            let key = "num_particles_per_cell_each_dim";
            let n = table
                .get_uints(species, key)?
                .ok_or_else(|| ConfigError::MissingParameter {
                    species: species.to_string(),
                    parameter: key.to_string(),
                })?;
            let n: [u64; 3] = match n[..] {
                [nx, nz] => [nx, 1, nz],
                [nx, ny, nz] => [nx, ny, nz],
                _ => {
                    let got = format!("expected 2 or 3 values, got {}", n.len());
                    return Err(invalid(species, key, got));
                }
            };
            if n.contains(&0) {
                return Err(invalid(species, key, "every count must be >= 1".into()));
            }
            let as_u32 = |v: u64| {
                u32::try_from(v).map_err(|_| invalid(species, key, format!("{v} is too large")))
            };
            let n = [as_u32(n[0])?, as_u32(n[1])?, as_u32(n[2])?];
            Ok(InjectionStyle::NUniformPerCell(n))
        }
        "nrandompercell" => {
            let key = "num_particles_per_cell";
            let n = table
                .get_uint(species, key)?
                .ok_or_else(|| ConfigError::MissingParameter {
                    species: species.to_string(),
                    parameter: key.to_string(),
                })?;
            let n = u32::try_from(n)
                .map_err(|_| invalid(species, key, format!("{n} is too large")))?;
            if n == 0 {
                return Err(invalid(species, key, "must be >= 1".into()));
            }
            Ok(InjectionStyle::NRandomPerCell(n))
        }
        "singleparticle" => {
            let position = read_vec3(table, species, "single_particle_pos")?;
            let weight = require_constant(table, species, "single_particle_weight", constants)?;
            if !(weight.is_finite() && weight > 0.0) {
                let reason = format!("must be > 0, got {weight}");
                return Err(invalid(species, "single_particle_weight", reason));
            }
            Ok(InjectionStyle::SingleParticle { position, weight })
        }
        _ => Err(unknown(species, "injection_style", name, STYLES)),
    }
}

fn read_density(
    table: &ParameterTable,
    species: &str,
    arena: &ManagedArena,
    profiles: &CustomProfiles,
    constants: &Constants,
) -> Result<InjectorDensity, ConfigError> {
    let kind = table.require_str(species, "profile")?;
    match kind.to_ascii_lowercase().as_str() {
        "constant" => Ok(InjectorDensity::Constant(require_constant(
            table, species, "density", constants,
        )?)),
        "parse_density_function" => {
            let key = "density_function(x,y,z)";
            let text = table.require_str(species, key)?;
            Ok(InjectorDensity::Parser(compile(species, key, text, constants)?))
        }
        "custom" => {
            let name = table
                .get_str(species, "custom_profile_function")
                .unwrap_or("default");
            let profile = profiles.density(name).ok_or_else(|| {
                invalid(
                    species,
                    "custom_profile_function",
                    format!(
                        "'{name}' is not registered (known: {})",
                        profiles.density_names().collect::<Vec<_>>().join(", ")
                    ),
                )
            })?;
            let params = table
                .get_reals(species, "custom_profile_params")?
                .ok_or_else(|| ConfigError::MissingParameter {
                    species: species.to_string(),
                    parameter: "custom_profile_params".to_string(),
                })?;
            InjectorDensity::custom(arena, profile, &params)
                .map_err(|source| injector(species, "custom_profile_params", source))
        }
        _ => Err(unknown(species, "profile", kind, DENSITY_PROFILES)),
    }
}

fn read_momentum(
    table: &ParameterTable,
    species: &str,
    arena: &ManagedArena,
    profiles: &CustomProfiles,
    constants: &Constants,
    style: &InjectionStyle,
) -> Result<InjectorMomentum, ConfigError> {
    if matches!(style, InjectionStyle::SingleParticle { .. }) {
        // Given as gamma * beta; stored as gamma * v.
        let v = read_vec3(table, species, "single_particle_vel")?;
        return Ok(InjectorMomentum::Constant([v[0] * C, v[1] * C, v[2] * C]));
    }

    let component = |key: &str| -> Result<Real, ConfigError> {
        Ok(get_constant(table, species, key, constants)?.unwrap_or(0.0))
    };
    let kind = table
        .get_str(species, "momentum_distribution_type")
        .unwrap_or("constant");
    match kind.to_ascii_lowercase().as_str() {
        "constant" => Ok(InjectorMomentum::Constant([
            component("ux")?,
            component("uy")?,
            component("uz")?,
        ])),
        "gaussian" => {
            let mean = [component("ux_m")?, component("uy_m")?, component("uz_m")?];
            let spread = [component("ux_th")?, component("uy_th")?, component("uz_th")?];
            InjectorMomentum::gaussian(mean, spread)
                .map_err(|source| injector(species, "ux_th", source))
        }
        "radial_expansion" => Ok(InjectorMomentum::RadialExpansion {
            u_over_r: component("u_over_r")?,
        }),
        "parse_momentum_function" => {
            let expr = |axis: &str| -> Result<Expression, ConfigError> {
                let key = format!("momentum_function_{axis}(x,y,z)");
                let text = table.require_str(species, &key)?;
                compile(species, &key, text, constants)
            };
            Ok(InjectorMomentum::parser(expr("ux")?, expr("uy")?, expr("uz")?))
        }
        "custom" => {
            let name = table
                .get_str(species, "custom_momentum_function")
                .unwrap_or("default");
            let profile = profiles.momentum(name).ok_or_else(|| {
                invalid(
                    species,
                    "custom_momentum_function",
                    format!(
                        "'{name}' is not registered (known: {})",
                        profiles.momentum_names().collect::<Vec<_>>().join(", ")
                    ),
                )
            })?;
            let params = table
                .get_reals(species, "custom_momentum_params")?
                .ok_or_else(|| ConfigError::MissingParameter {
                    species: species.to_string(),
                    parameter: "custom_momentum_params".to_string(),
                })?;
            InjectorMomentum::custom(arena, profile, &params)
                .map_err(|source| injector(species, "custom_momentum_params", source))
        }
        _ => Err(unknown(species, "momentum_distribution_type", kind, MOMENTUM_TYPES)),
    }
}
