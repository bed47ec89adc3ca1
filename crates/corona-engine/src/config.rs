//! Species configuration.
//!
//! [`SpeciesConfig`] holds everything about a species that stays fixed for
//! the run: charge and mass, the pusher, the shape order, how buffer
//! particles couple to the coarse patch, the smoothing filter, and field
//! ionization. It is read from a [`ParameterTable`] with
//! [`SpeciesConfig::from_table`] or assembled with
//! [`SpeciesConfig::builder`]. Both paths end in
//! [`validate`](SpeciesConfig::validate), so no invalid configuration
//! reaches the timestep loop.

use corona_core::constants::{M_E, Q_E};
use corona_core::{Backend, ConfigError, IntComp, ParameterTable, Real, RealComp, SpeciesId};
use corona_injector::{expression_constants, get_constant};
use corona_solver::ShapeOrder;

use crate::ionization::{element_energies, IonizationModule};
use crate::pusher::PusherAlgo;

// ── BufferDeposit ──────────────────────────────────────────────────

/// Where particles in the current-deposition buffer deposit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BufferDeposit {
    /// On the coarse patch only.
    #[default]
    Instead,
    /// On the coarse patch and on the fine patch.
    Additionally,
}

impl BufferDeposit {
    /// Parameter-table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Instead => "instead",
            Self::Additionally => "additionally",
        }
    }

    /// Inverse of [`BufferDeposit::name`], case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "instead" => Some(Self::Instead),
            "additionally" => Some(Self::Additionally),
            _ => None,
        }
    }
}

// ── IonizationConfig ───────────────────────────────────────────────

/// Field-ionization settings of one species.
#[derive(Clone, Debug, PartialEq)]
pub struct IonizationConfig {
    /// Ionization energy of each level, in eV. Its length is the atomic
    /// number.
    pub energies: Vec<Real>,
    /// Level every particle starts at.
    pub initial_level: u32,
    /// Species that receives the electrons freed by ionization. The step
    /// only reports which particles ionized; creating the products is up
    /// to the caller.
    pub product: Option<String>,
}

// ── SpeciesConfig ──────────────────────────────────────────────────

/// Immutable configuration of one particle species.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesConfig {
    /// Species name, used as the parameter-table prefix and in errors.
    pub name: String,
    /// Species identifier.
    pub id: SpeciesId,
    /// Charge of one physical particle, in C.
    pub charge: Real,
    /// Mass of one physical particle, in kg.
    pub mass: Real,
    /// Momentum integrator.
    pub pusher: PusherAlgo,
    /// Gather and deposition shape.
    pub shape: ShapeOrder,
    /// Coupling of buffer particles to the coarse patch.
    pub buffer_deposit: BufferDeposit,
    /// Deposit every particle on the coarse patch.
    pub deposit_on_main_grid: bool,
    /// Gather every particle from the coarse patch.
    pub gather_from_main_grid: bool,
    /// 1-2-1 passes per axis applied to the fields before gather, if any.
    pub filter: Option<[u32; 3]>,
    /// Also deposit charge density.
    pub deposit_charge: bool,
    /// Field ionization, if enabled.
    pub ionization: Option<IonizationConfig>,
    /// Extra real attribute names.
    pub extra_real: Vec<String>,
    /// Extra integer attribute names.
    pub extra_int: Vec<String>,
    /// Loop scheduling.
    pub backend: Backend,
    /// Base seed of the per-tile random streams.
    pub seed: u64,
}

const PUSHERS: &str = "boris, vay";
const BUFFER_DEPOSITS: &str = "instead, additionally";
const BACKENDS: &str = "sequential, parallel";

impl SpeciesConfig {
    /// Start a builder for a species named `name` with electron charge and
    /// mass and every option at its default.
    pub fn builder(name: impl Into<String>) -> SpeciesConfigBuilder {
        SpeciesConfigBuilder::new(name.into())
    }

    /// Read the configuration of `species` from `table`.
    ///
    /// Keys are `species.<parameter>`. `charge` and `mass` are required and
    /// may be constant expressions such as `-q_e` or `1836*m_e`.
    pub fn from_table(
        table: &ParameterTable,
        species: &str,
        id: SpeciesId,
    ) -> Result<Self, ConfigError> {
        let constants = expression_constants(table)?;
        let required = |parameter: &str| -> Result<Real, ConfigError> {
            get_constant(table, species, parameter, &constants)?.ok_or_else(|| {
                ConfigError::MissingParameter {
                    species: species.to_string(),
                    parameter: parameter.to_string(),
                }
            })
        };
        let charge = required("charge")?;
        let mass = required("mass")?;

        let pusher = match table.get_str(species, "particle_pusher") {
            None => PusherAlgo::default(),
            Some(v) => PusherAlgo::from_name(v)
                .ok_or_else(|| unknown(species, "particle_pusher", v, PUSHERS))?,
        };
        let shape = match table.get_uint(species, "particle_shape")? {
            None => ShapeOrder::default(),
            Some(n) => ShapeOrder::from_order(n).ok_or_else(|| ConfigError::InvalidParameter {
                species: species.to_string(),
                parameter: "particle_shape".to_string(),
                reason: format!("order must be 1, 2 or 3, got {n}"),
            })?,
        };
        let buffer_deposit = match table.get_str(species, "buffer_deposition") {
            None => BufferDeposit::default(),
            Some(v) => BufferDeposit::from_name(v)
                .ok_or_else(|| unknown(species, "buffer_deposition", v, BUFFER_DEPOSITS))?,
        };
        let backend = match table.get_str(species, "backend") {
            None => Backend::default(),
            Some(v) => {
                Backend::from_name(v).ok_or_else(|| unknown(species, "backend", v, BACKENDS))?
            }
        };

        let filter = if table.get_bool(species, "use_filter")?.unwrap_or(false) {
            let key = "filter_npass_each_dir";
            let npass = match table.get_uints(species, key)?.as_deref() {
                None => [1, 1, 1],
                Some(&[nx, nz]) => [to_u32(species, key, nx)?, 0, to_u32(species, key, nz)?],
                Some(&[nx, ny, nz]) => [
                    to_u32(species, key, nx)?,
                    to_u32(species, key, ny)?,
                    to_u32(species, key, nz)?,
                ],
                Some(other) => {
                    return Err(ConfigError::InvalidParameter {
                        species: species.to_string(),
                        parameter: key.to_string(),
                        reason: format!("expected 2 or 3 values, got {}", other.len()),
                    })
                }
            };
            Some(npass)
        } else {
            None
        };

        let ionization = if table.get_bool(species, "do_field_ionization")?.unwrap_or(false) {
            Some(read_ionization(table, species)?)
        } else {
            None
        };

        let names = |key: &str| -> Vec<String> {
            table
                .get_str(species, key)
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default()
        };

        let config = Self {
            name: species.to_string(),
            id,
            charge,
            mass,
            pusher,
            shape,
            buffer_deposit,
            deposit_on_main_grid: table.get_bool(species, "deposit_on_main_grid")?.unwrap_or(false),
            gather_from_main_grid: table
                .get_bool(species, "gather_from_main_grid")?
                .unwrap_or(false),
            filter,
            deposit_charge: table.get_bool(species, "deposit_charge")?.unwrap_or(false),
            ionization,
            extra_real: names("extra_real_components"),
            extra_int: names("extra_int_components"),
            backend,
            seed: table.get_uint(species, "seed")?.unwrap_or(0),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |parameter: &str, reason: String| ConfigError::InvalidParameter {
            species: self.name.clone(),
            parameter: parameter.to_string(),
            reason,
        };
        // 1. A name is required; it prefixes every parameter.
        if self.name.trim().is_empty() {
            return Err(invalid("name", "species name must not be empty".into()));
        }
        // 2. Mass must be finite and positive, charge finite.
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(invalid("mass", format!("must be finite and > 0, got {}", self.mass)));
        }
        if !self.charge.is_finite() {
            return Err(invalid("charge", format!("must be finite, got {}", self.charge)));
        }
        // 3. Ionization table must be usable.
        if let Some(ion) = &self.ionization {
            IonizationModule::new(&self.name, &ion.energies, ion.initial_level)?;
        }
        if let Some(product) = self.ionization.as_ref().and_then(|ion| ion.product.as_ref()) {
            if product.trim().is_empty() || *product == self.name {
                return Err(invalid(
                    "ionization_product_species",
                    format!("'{product}' must name another species"),
                ));
            }
        }
        // 4. Extra attribute names must not shadow built-ins or repeat.
        for (list, parameter) in [
            (&self.extra_real, "extra_real_components"),
            (&self.extra_int, "extra_int_components"),
        ] {
            for (i, name) in list.iter().enumerate() {
                let builtin = RealComp::ALL.iter().any(|c| c.name() == name)
                    || name == IntComp::IonizationLevel.name();
                if builtin || list[..i].contains(name) {
                    return Err(invalid(parameter, format!("'{name}' is already defined")));
                }
            }
        }
        Ok(())
    }

    /// The ionization module, if field ionization is enabled.
    pub fn ionization_module(&self) -> Result<Option<IonizationModule>, ConfigError> {
        self.ionization
            .as_ref()
            .map(|ion| IonizationModule::new(&self.name, &ion.energies, ion.initial_level))
            .transpose()
    }
}

fn read_ionization(table: &ParameterTable, species: &str) -> Result<IonizationConfig, ConfigError> {
    let energies = match table.get_reals(species, "ionization_energies")? {
        Some(e) => e,
        None => {
            let element = table.require_str(species, "physical_element")?;
            element_energies(element)
                .ok_or_else(|| ConfigError::InvalidParameter {
                    species: species.to_string(),
                    parameter: "physical_element".to_string(),
                    reason: format!("no ionization table for '{element}'"),
                })?
                .to_vec()
        }
    };
    let key = "ionization_initial_level";
    let initial_level = to_u32(species, key, table.get_uint(species, key)?.unwrap_or(0))?;
    Ok(IonizationConfig {
        energies,
        initial_level,
        product: table.get_str(species, "ionization_product_species").map(str::to_string),
    })
}

fn to_u32(species: &str, parameter: &str, v: u64) -> Result<u32, ConfigError> {
    u32::try_from(v).map_err(|_| ConfigError::InvalidParameter {
        species: species.to_string(),
        parameter: parameter.to_string(),
        reason: format!("{v} is too large"),
    })
}

fn unknown(species: &str, parameter: &str, value: &str, allowed: &'static str) -> ConfigError {
    ConfigError::UnknownVariant {
        species: species.to_string(),
        parameter: parameter.to_string(),
        value: value.to_string(),
        allowed,
    }
}

// ── SpeciesConfigBuilder ───────────────────────────────────────────

/// Builder for [`SpeciesConfig`].
#[derive(Clone, Debug)]
pub struct SpeciesConfigBuilder {
    config: SpeciesConfig,
}

impl SpeciesConfigBuilder {
    fn new(name: String) -> Self {
        Self {
            config: SpeciesConfig {
                name,
                id: SpeciesId(0),
                charge: -Q_E,
                mass: M_E,
                pusher: PusherAlgo::default(),
                shape: ShapeOrder::default(),
                buffer_deposit: BufferDeposit::default(),
                deposit_on_main_grid: false,
                gather_from_main_grid: false,
                filter: None,
                deposit_charge: false,
                ionization: None,
                extra_real: Vec::new(),
                extra_int: Vec::new(),
                backend: Backend::default(),
                seed: 0,
            },
        }
    }

    /// Species identifier.
    pub fn id(mut self, id: SpeciesId) -> Self {
        self.config.id = id;
        self
    }

    /// Charge and mass of one physical particle.
    pub fn charge_mass(mut self, charge: Real, mass: Real) -> Self {
        self.config.charge = charge;
        self.config.mass = mass;
        self
    }

    /// Momentum integrator.
    pub fn pusher(mut self, pusher: PusherAlgo) -> Self {
        self.config.pusher = pusher;
        self
    }

    /// Shape order.
    pub fn shape(mut self, shape: ShapeOrder) -> Self {
        self.config.shape = shape;
        self
    }

    /// Buffer coupling.
    pub fn buffer_deposit(mut self, mode: BufferDeposit) -> Self {
        self.config.buffer_deposit = mode;
        self
    }

    /// Deposit every particle on the coarse patch.
    pub fn deposit_on_main_grid(mut self, on: bool) -> Self {
        self.config.deposit_on_main_grid = on;
        self
    }

    /// Gather every particle from the coarse patch.
    pub fn gather_from_main_grid(mut self, on: bool) -> Self {
        self.config.gather_from_main_grid = on;
        self
    }

    /// Smooth the fields with `npass` 1-2-1 passes per axis before gather.
    pub fn filter(mut self, npass: [u32; 3]) -> Self {
        self.config.filter = Some(npass);
        self
    }

    /// Also deposit charge density.
    pub fn deposit_charge(mut self, on: bool) -> Self {
        self.config.deposit_charge = on;
        self
    }

    /// Enable field ionization.
    pub fn ionization(mut self, energies: Vec<Real>, initial_level: u32) -> Self {
        self.config.ionization = Some(IonizationConfig {
            energies,
            initial_level,
            product: None,
        });
        self
    }

    /// Name the species that receives ionization electrons. Has no effect
    /// unless [`ionization`](Self::ionization) was called first.
    pub fn ionization_product(mut self, species: impl Into<String>) -> Self {
        if let Some(ion) = self.config.ionization.as_mut() {
            ion.product = Some(species.into());
        }
        self
    }

    /// Add an extra real attribute.
    pub fn extra_real(mut self, name: impl Into<String>) -> Self {
        self.config.extra_real.push(name.into());
        self
    }

    /// Add an extra integer attribute.
    pub fn extra_int(mut self, name: impl Into<String>) -> Self {
        self.config.extra_int.push(name.into());
        self
    }

    /// Loop scheduling.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Base random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<SpeciesConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
